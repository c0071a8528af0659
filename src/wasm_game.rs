// Custom Connections – A word grouping game
// Copyright (C) 2024  Neil Roberts
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use wasm_bindgen::prelude::*;
use web_sys::console;
use super::game::{
    Game, Message, Status, TileState, CompletedCategory,
    MAX_MISTAKES, MESSAGE_TIMEOUT_MS, SELECTION_SIZE,
};
use super::puzzle::Puzzle;
use super::share::{self, ShareOutcome};
use super::token::{self, LoadError};
use super::wasm_page::{
    self, Context, EventClosure, MessageTimer,
    set_class, set_element_text, set_visibility, show_error,
};

const SHARE_BUTTON_TEXT: &'static str = "Share";
const SHARING_BUTTON_TEXT: &'static str = "Sharing...";

type PromiseClosure = Closure::<dyn FnMut(JsValue)>;

struct PlayPage {
    context: Context,
    game: Game,

    theme_closure: Option<EventClosure>,
    board_closure: Option<EventClosure>,
    share_closure: Option<EventClosure>,
    new_puzzle_closure: Option<EventClosure>,
    share_response_closure: Option<PromiseClosure>,
    share_body_closure: Option<PromiseClosure>,
    share_error_closure: Option<PromiseClosure>,

    board: web_sys::HtmlElement,
    tiles: Vec<web_sys::HtmlElement>,
    selection: web_sys::HtmlElement,
    mistakes: web_sys::HtmlElement,
    completed: web_sys::HtmlElement,
    share_button: web_sys::HtmlElement,
    share_status: web_sys::HtmlElement,
    share_text: web_sys::HtmlTextAreaElement,

    message_timer: Option<MessageTimer>,
    share_status_timer: Option<MessageTimer>,
    // Link being shared while a request to the shortener is in flight
    sharing: Option<String>,
}

impl PlayPage {
    fn new(
        context: Context,
        puzzle: Puzzle,
        theme_closure: EventClosure,
    ) -> Result<Box<PlayPage>, String> {
        let board = context.html_element("board")?;
        let selection = context.html_element("selection")?;
        let mistakes = context.html_element("mistakes")?;
        let completed = context.html_element("completed")?;
        let share_button = context.html_element("share-button")?;
        let share_status = context.html_element("share-status")?;

        let Some(share_text) =
            context.document.get_element_by_id("share-text")
            .and_then(|c| c.dyn_into::<web_sys::HtmlTextAreaElement>().ok())
        else {
            return Err("failed to get share text".to_string());
        };

        let game = Game::new(puzzle, &mut rand::thread_rng());

        let mut page = Box::new(PlayPage {
            context,
            game,
            theme_closure: Some(theme_closure),
            board_closure: None,
            share_closure: None,
            new_puzzle_closure: None,
            share_response_closure: None,
            share_body_closure: None,
            share_error_closure: None,
            board,
            tiles: Vec::new(),
            selection,
            mistakes,
            completed,
            share_button,
            share_status,
            share_text,
            message_timer: None,
            share_status_timer: None,
            sharing: None,
        });

        page.create_tiles()?;
        page.create_closures();
        page.flush_game_changes();

        page.context.set_element_visibility("no-puzzle", false);
        page.context.set_element_visibility("game-contents", true);

        Ok(page)
    }

    fn create_tiles(&mut self) -> Result<(), String> {
        for (index, word) in self.game.board().iter().enumerate() {
            let tile = self.context.create_element("button")?;

            let _ = tile.set_attribute("type", "button");
            let _ = tile.set_attribute("data-index", &index.to_string());
            let _ = tile.class_list().add_1("tile");
            set_element_text(&tile, &word.text);

            let _ = self.board.append_with_node_1(&tile);

            self.tiles.push(tile);
        }

        Ok(())
    }

    fn create_closures(&mut self) {
        let page_pointer = self as *mut PlayPage;

        let board_closure = EventClosure::new(move |event: JsValue| {
            let page = unsafe { &mut *page_pointer };
            page.handle_board_click(event);
        });

        let _ = self.board.add_event_listener_with_callback(
            "click",
            board_closure.as_ref().unchecked_ref(),
        );

        self.board_closure = Some(board_closure);

        let share_closure = EventClosure::new(move |_event: JsValue| {
            let page = unsafe { &mut *page_pointer };
            page.start_share();
        });

        self.context.add_click_listener("share-button", &share_closure);

        self.share_closure = Some(share_closure);

        let new_puzzle_closure = EventClosure::new(move |_event: JsValue| {
            let page = unsafe { &*page_pointer };
            page.context.navigate(share::CREATOR_PATH);
        });

        self.context.add_click_listener("new-puzzle", &new_puzzle_closure);

        self.new_puzzle_closure = Some(new_puzzle_closure);

        let share_response_closure = PromiseClosure::new(move |v: JsValue| {
            let page = unsafe { &mut *page_pointer };
            page.share_response_received(v);
        });

        let share_body_closure = PromiseClosure::new(move |v: JsValue| {
            let page = unsafe { &mut *page_pointer };
            page.finish_share(v.as_string());
        });

        let share_error_closure = PromiseClosure::new(move |_| {
            console::log_1(&"Error fetching short link".into());
            let page = unsafe { &mut *page_pointer };
            page.finish_share(None);
        });

        self.share_response_closure = Some(share_response_closure);
        self.share_body_closure = Some(share_body_closure);
        self.share_error_closure = Some(share_error_closure);
    }

    fn tile_index_for_event(&self, event: &JsValue) -> Option<usize> {
        let event = event.dyn_ref::<web_sys::Event>()?;
        let target = event.target()?;
        let element = target.dyn_into::<web_sys::Element>().ok()?;
        let tile = element.closest(".tile").ok()??;

        tile.get_attribute("data-index")?.parse::<usize>().ok()
    }

    fn handle_board_click(&mut self, event: JsValue) {
        let Some(index) = self.tile_index_for_event(&event)
        else {
            return;
        };

        self.game.toggle_word(index);
        self.flush_game_changes();
    }

    fn update_tile(&self, index: usize) {
        let tile = &self.tiles[index];

        match self.game.tile_state(index) {
            TileState::Normal => set_class(tile, "selected", false),
            TileState::Selected => set_class(tile, "selected", true),
            TileState::Completed { .. } => {
                set_class(tile, "selected", false);
                set_visibility(tile, false);
            },
        }
    }

    fn add_completed_category(&self, completed: &CompletedCategory) {
        let category = self.game.category(completed.category);

        let Ok(div) = self.context.create_element("div")
        else {
            return;
        };

        let _ = div.class_list().add_1("completed-category");
        set_class(&div, "revealed", completed.revealed);
        let _ = div.style().set_property(
            "background-color",
            category.color.as_str(),
        );

        if let Ok(name) = self.context.create_element("h3") {
            set_element_text(&name, &category.name);
            let _ = div.append_with_node_1(&name);
        }

        if let Ok(words) = self.context.create_element("p") {
            let text = completed.words.iter()
                .map(|&index| self.game.word(index).text.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            set_element_text(&words, &text);
            let _ = div.append_with_node_1(&words);
        }

        let _ = self.completed.append_with_node_1(&div);
    }

    fn update_selection(&self) {
        wasm_page::clear_element(&self.selection);

        for word in self.game.selection_slots() {
            let Ok(slot) = self.context.create_element("span")
            else {
                continue;
            };

            let _ = slot.class_list().add_1("selection-slot");
            set_class(&slot, "filled", word.is_some());
            set_element_text(&slot, word.unwrap_or(""));

            let _ = self.selection.append_with_node_1(&slot);
        }

        let _ = self.selection.set_attribute(
            "title",
            &format!(
                "{} / {} selected",
                self.game.selection().len(),
                SELECTION_SIZE,
            ),
        );
    }

    fn update_mistakes(&self, n_mistakes: u32) {
        wasm_page::clear_element(&self.mistakes);

        for i in 0..MAX_MISTAKES {
            let Ok(dot) = self.context.create_element("span")
            else {
                continue;
            };

            let _ = dot.class_list().add_1("mistake-dot");
            set_class(&dot, "used", i < n_mistakes);

            let _ = self.mistakes.append_with_node_1(&dot);
        }

        let _ = self.mistakes.set_attribute(
            "title",
            &format!("{} / {} mistakes", n_mistakes, MAX_MISTAKES),
        );
    }

    fn show_message(&mut self, message: Message) {
        let element = &self.context.message;

        set_element_text(element, message.text());
        set_class(element, "error", message.is_error());
        set_class(element, "success", !message.is_error());
        set_visibility(element, true);

        // Replacing the timer cancels the previous one
        self.message_timer = None;

        if message.is_transient() {
            let page_pointer = self as *mut PlayPage;

            match MessageTimer::new(
                &self.context.window,
                MESSAGE_TIMEOUT_MS,
                move || {
                    let page = unsafe { &*page_pointer };
                    set_visibility(&page.context.message, false);
                },
            ) {
                Ok(timer) => self.message_timer = Some(timer),
                Err(e) => console::log_1(&e.into()),
            }
        }
    }

    fn flush_game_changes(&mut self) {
        for index in self.game.changed_tiles() {
            self.update_tile(index);
        }

        if self.game.changed_selection() {
            self.update_selection();
        }

        let completed = self.game.changed_completed().to_vec();

        for category in completed.iter() {
            self.add_completed_category(category);
        }

        if let Some(n_mistakes) = self.game.changed_mistakes() {
            self.update_mistakes(n_mistakes);
        }

        if let Some(status) = self.game.changed_status() {
            set_class(&self.board, "finished", status != Status::Playing);
        }

        if let Some(message) = self.game.pending_message() {
            self.show_message(message);
        }
    }

    fn set_sharing(&self, sharing: bool) {
        set_element_text(
            &self.share_button,
            if sharing { SHARING_BUTTON_TEXT } else { SHARE_BUTTON_TEXT },
        );

        if sharing {
            let _ = self.share_button.set_attribute("disabled", "");
        } else {
            let _ = self.share_button.remove_attribute("disabled");
        }
    }

    fn start_share(&mut self) {
        if self.sharing.is_some() {
            return;
        }

        let token = match token::encode(self.game.puzzle()) {
            Ok(t) => t,
            Err(e) => {
                show_error(&e.to_string());
                return;
            },
        };

        let Some(origin) = self.context.origin()
        else {
            show_error("failed to get origin");
            return;
        };

        let long_url = share::share_url(&origin, &token);

        let (Some(response_closure), Some(error_closure)) = (
            self.share_response_closure.as_ref(),
            self.share_error_closure.as_ref(),
        ) else {
            return;
        };

        let request_url = format!(
            "{}?url={}",
            share::SHORTEN_PATH,
            String::from(js_sys::encode_uri_component(&long_url)),
        );

        let mut request_init = web_sys::RequestInit::new();
        request_init.cache(web_sys::RequestCache::NoCache);

        let promise = self.context.window.fetch_with_str_and_init(
            &request_url,
            &request_init,
        );

        let _ = promise.then2(response_closure, error_closure);

        self.sharing = Some(long_url);
        self.share_status_timer = None;
        set_element_text(&self.share_status, "");
        self.set_sharing(true);
    }

    fn share_response_received(&mut self, v: JsValue) {
        let Ok(response) = v.dyn_into::<web_sys::Response>()
        else {
            self.finish_share(None);
            return;
        };

        let (Some(body_closure), Some(error_closure)) = (
            self.share_body_closure.as_ref(),
            self.share_error_closure.as_ref(),
        ) else {
            return;
        };

        match response.text() {
            Ok(promise) => {
                let _ = promise.then2(body_closure, error_closure);
            },
            Err(_) => self.finish_share(None),
        }
    }

    fn finish_share(&mut self, body: Option<String>) {
        let Some(long_url) = self.sharing.take()
        else {
            return;
        };

        let link = share::link_from_response(&long_url, body.as_deref());

        self.share_text.set_value(&link);
        set_visibility(&self.share_text, true);

        let copied = wasm_page::copy_text(
            &self.context.document,
            &self.share_text,
        );

        let outcome = ShareOutcome::new(&long_url, &link, copied);

        set_element_text(&self.share_status, outcome.text());
        self.set_sharing(false);

        let page_pointer = self as *mut PlayPage;

        match MessageTimer::new(
            &self.context.window,
            MESSAGE_TIMEOUT_MS,
            move || {
                let page = unsafe { &*page_pointer };
                set_element_text(&page.share_status, "");
            },
        ) {
            Ok(timer) => self.share_status_timer = Some(timer),
            Err(e) => console::log_1(&e.into()),
        }
    }
}

fn show_no_puzzle(context: &Context, error: &LoadError) {
    if let LoadError::Invalid(e) = error {
        console::log_1(&format!("Error loading puzzle: {}", e).into());
    }

    context.set_element_visibility("game-contents", false);

    if let Ok(element) = context.html_element("no-puzzle-message") {
        set_element_text(&element, &error.to_string());
    }

    context.set_element_visibility("no-puzzle", true);
}

#[wasm_bindgen]
pub fn init_play() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));

    let context = match Context::new() {
        Ok(c) => c,
        Err(e) => {
            show_error(&e);
            return;
        }
    };

    let theme_closure = wasm_page::init_theme(&context);

    let token = context.query_param(token::QUERY_PARAM);

    match token::load(token.as_deref()) {
        Ok(puzzle) => match PlayPage::new(context, puzzle, theme_closure) {
            Ok(page) => {
                // Leak the page so that it will live as long as the
                // web page
                std::mem::forget(page);
            },
            Err(e) => show_error(&e),
        },
        Err(e) => {
            show_no_puzzle(&context, &e);
            theme_closure.forget();
        },
    }
}

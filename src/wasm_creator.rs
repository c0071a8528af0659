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
use super::puzzle::{
    Puzzle, Category, Color, N_CATEGORIES, N_WORDS_PER_CATEGORY,
};
use super::share;
use super::token;
use super::wasm_page::{
    self, Context, EventClosure, set_element_text, set_visibility, show_error,
};

struct CategoryInputs {
    div: web_sys::HtmlElement,
    color: Color,
    name: web_sys::HtmlInputElement,
    words: Vec<web_sys::HtmlInputElement>,
}

struct Creator {
    context: Context,

    _theme_closure: EventClosure,
    create_closure: Option<EventClosure>,
    fill_closure: Option<EventClosure>,

    error: web_sys::HtmlElement,
    categories: Vec<CategoryInputs>,
}

impl Creator {
    fn new(
        context: Context,
        theme_closure: EventClosure,
    ) -> Result<Box<Creator>, String> {
        let error = context.html_element("creator-error")?;

        let mut creator = Box::new(Creator {
            context,
            _theme_closure: theme_closure,
            create_closure: None,
            fill_closure: None,
            error,
            categories: Vec::with_capacity(N_CATEGORIES),
        });

        creator.create_inputs()?;
        creator.create_closures();

        Ok(creator)
    }

    fn create_input(
        &self,
        placeholder: &str,
    ) -> Result<web_sys::HtmlInputElement, String> {
        self.context.create_element("input")?
            .dyn_into::<web_sys::HtmlInputElement>()
            .map_err(|_| "failed to create input".to_string())
            .map(|input| {
                input.set_type("text");
                input.set_placeholder(placeholder);
                input
            })
    }

    fn create_inputs(&mut self) -> Result<(), String> {
        let container = self.context.html_element("categories")?;

        for slot in 0..N_CATEGORIES {
            let div = self.context.create_element("div")?;
            let _ = div.class_list().add_1("category-inputs");
            let _ = div.style().set_property(
                "border-color",
                Color::for_slot(slot).as_str(),
            );

            let name = self.create_input(
                &format!("Category {} Name", slot + 1),
            )?;
            let _ = name.class_list().add_1("category-name");
            let _ = div.append_with_node_1(&name);

            let words_div = self.context.create_element("div")?;
            let _ = words_div.class_list().add_1("word-inputs");

            let mut words = Vec::with_capacity(N_WORDS_PER_CATEGORY);

            for word_num in 0..N_WORDS_PER_CATEGORY {
                let word = self.create_input(
                    &format!("Word {}", word_num + 1),
                )?;
                let _ = words_div.append_with_node_1(&word);
                words.push(word);
            }

            let _ = div.append_with_node_1(&words_div);
            let _ = container.append_with_node_1(&div);

            self.categories.push(CategoryInputs {
                div,
                color: Color::for_slot(slot),
                name,
                words,
            });
        }

        Ok(())
    }

    fn create_closures(&mut self) {
        let creator_pointer = self as *mut Creator;

        let create_closure = EventClosure::new(move |_event: JsValue| {
            let creator = unsafe { &*creator_pointer };
            creator.create_puzzle();
        });

        self.context.add_click_listener("create-puzzle", &create_closure);

        self.create_closure = Some(create_closure);

        let fill_closure = EventClosure::new(move |_event: JsValue| {
            let creator = unsafe { &mut *creator_pointer };
            creator.fill(&Puzzle::sample());
        });

        self.context.add_click_listener("fill-test-data", &fill_closure);

        self.fill_closure = Some(fill_closure);
    }

    fn read_puzzle(&self) -> Puzzle {
        let categories = std::array::from_fn(|slot| {
            let inputs = &self.categories[slot];

            Category {
                name: inputs.name.value(),
                words: std::array::from_fn(|i| inputs.words[i].value()),
                color: inputs.color.clone(),
            }
        });

        Puzzle::new(categories)
    }

    fn fill(&mut self, puzzle: &Puzzle) {
        for (inputs, category) in self.categories.iter_mut()
            .zip(puzzle.categories.iter())
        {
            inputs.name.set_value(&category.name);
            inputs.color = category.color.clone();
            let _ = inputs.div.style().set_property(
                "border-color",
                inputs.color.as_str(),
            );

            for (input, word) in inputs.words.iter().zip(category.words.iter())
            {
                input.set_value(word);
            }
        }

        self.set_error(None);
    }

    fn set_error(&self, error: Option<&str>) {
        set_element_text(&self.error, error.unwrap_or(""));
        set_visibility(&self.error, error.is_some());
    }

    fn create_puzzle(&self) {
        let puzzle = self.read_puzzle();

        let token = match token::encode(&puzzle) {
            Ok(t) => t,
            Err(token::Error::Invalid(e)) => {
                self.set_error(Some(&e.to_string()));
                return;
            },
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

        self.set_error(None);
        self.context.navigate(&share::share_url(&origin, &token));
    }
}

#[wasm_bindgen]
pub fn init_creator() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));

    let context = match Context::new() {
        Ok(c) => c,
        Err(e) => {
            show_error(&e);
            return;
        }
    };

    let theme_closure = wasm_page::init_theme(&context);

    // Opening the creator with a puzzle link edits that puzzle
    let existing = context.query_param(token::QUERY_PARAM)
        .and_then(|token| token::decode(&token).ok());

    match Creator::new(context, theme_closure) {
        Ok(mut creator) => {
            if let Some(puzzle) = existing.as_ref() {
                creator.fill(puzzle);
            }

            // Leak the creator so that it will live as long as the web
            // page
            std::mem::forget(creator);
        },
        Err(e) => show_error(&e),
    }
}

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

//! Helpers shared by the creator and the play page.

use wasm_bindgen::prelude::*;
use web_sys::console;
use super::theme::{self, Theme};

pub const THEME_TOGGLE_ID: &'static str = "theme-toggle";

pub type EventClosure = Closure::<dyn Fn(JsValue)>;

pub fn show_error(message: &str) {
    console::log_1(&message.into());

    let Some(window) = web_sys::window()
    else {
        return;
    };

    let Some(document) = window.document()
    else {
        return;
    };

    let Some(message_elem) = document.get_element_by_id("message")
    else {
        return;
    };

    message_elem.set_text_content(Some("An error occurred"));

    if let Ok(message_elem) = message_elem.dyn_into::<web_sys::HtmlElement>() {
        set_visibility(&message_elem, true);
    }
}

#[derive(Clone)]
pub struct Context {
    pub document: web_sys::HtmlDocument,
    pub window: web_sys::Window,
    pub message: web_sys::HtmlElement,
}

impl Context {
    pub fn new() -> Result<Context, String> {
        let Some(window) = web_sys::window()
        else {
            return Err("failed to get window".to_string());
        };

        let Some(document) = window.document()
            .and_then(|d| d.dyn_into::<web_sys::HtmlDocument>().ok())
        else {
            return Err("failed to get document".to_string());
        };

        let Some(message) = document.get_element_by_id("message")
            .and_then(|c| c.dyn_into::<web_sys::HtmlElement>().ok())
        else {
            return Err("failed to get message div".to_string());
        };

        Ok(Context {
            document,
            window,
            message,
        })
    }

    pub fn html_element(
        &self,
        id: &str,
    ) -> Result<web_sys::HtmlElement, String> {
        self.document.get_element_by_id(id)
            .and_then(|c| c.dyn_into::<web_sys::HtmlElement>().ok())
            .ok_or_else(|| format!("failed to get {}", id))
    }

    pub fn create_element(
        &self,
        name: &str,
    ) -> Result<web_sys::HtmlElement, String> {
        self.document.create_element(name).ok()
            .and_then(|e| e.dyn_into::<web_sys::HtmlElement>().ok())
            .ok_or_else(|| format!("failed to create {} element", name))
    }

    /// Returns the value of a parameter in the query string of the
    /// page’s location.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let location = self.document.location()?;
        let search = location.search().ok()?;
        let params = web_sys::UrlSearchParams::new_with_str(&search).ok()?;

        params.get(name)
    }

    pub fn origin(&self) -> Option<String> {
        self.document.location()?.origin().ok()
    }

    pub fn navigate(&self, url: &str) {
        let Some(location) = self.document.location()
        else {
            show_error("failed to get location");
            return;
        };

        if location.set_href(url).is_err() {
            show_error("failed to navigate");
        }
    }

    pub fn add_click_listener(&self, id: &str, closure: &EventClosure) {
        let Some(target) = self.document.get_element_by_id(id)
            .and_then(|c| c.dyn_into::<web_sys::EventTarget>().ok())
        else {
            console::log_1(&format!("missing {} button", id).into());
            return;
        };

        let _ = target.add_event_listener_with_callback(
            "click",
            closure.as_ref().unchecked_ref(),
        );
    }

    pub fn set_element_visibility(&self, id: &str, visibility: bool) {
        if let Ok(elem) = self.html_element(id) {
            set_visibility(&elem, visibility);
        }
    }
}

pub fn set_visibility(element: &web_sys::HtmlElement, visibility: bool) {
    let _ = element.style().set_property(
        "display",
        if visibility { "block" } else { "none" },
    );
}

pub fn set_class(element: &web_sys::Element, class: &str, value: bool) {
    let class_list = element.class_list();

    if value {
        let _ = class_list.add_1(class);
    } else {
        let _ = class_list.remove_1(class);
    }
}

pub fn clear_element(element: &web_sys::Element) {
    while let Some(child) = element.first_child() {
        let _ = element.remove_child(&child);
    }
}

pub fn set_element_text(element: &web_sys::Element, text: &str) {
    clear_element(element);

    if let Some(document) = element.owner_document() {
        let text = document.create_text_node(text);
        let _ = element.append_with_node_1(&text);
    }
}

/// Copies the contents of a text area to the clipboard. Returns
/// whether the browser reported success.
pub fn copy_text(
    document: &web_sys::HtmlDocument,
    textarea: &web_sys::HtmlTextAreaElement,
) -> bool {
    textarea.select();

    let copy_result = document.exec_command("copy");

    let _ = textarea.set_selection_range(0, 0);

    match copy_result {
        Ok(true) => true,
        Ok(false) | Err(_) => {
            console::log_1(&"copy command failed".into());
            false
        },
    }
}

pub fn get_local_storage(context: &Context) -> Option<web_sys::Storage> {
    match context.window.local_storage() {
        Ok(Some(local_storage)) => Some(local_storage),
        Ok(None) => {
            console::log_1(&"Local storage is None".into());
            None
        },
        Err(_) => {
            console::log_1(&"Error getting local storage".into());
            None
        },
    }
}

/// Runs a callback once after a delay. Dropping the timer cancels the
/// callback if it hasn’t run yet, so replacing a stored timer with a
/// new one supersedes it.
pub struct MessageTimer {
    window: web_sys::Window,
    handle: i32,
    _closure: Closure::<dyn FnMut()>,
}

impl MessageTimer {
    pub fn new<F>(
        window: &web_sys::Window,
        timeout_ms: i32,
        callback: F,
    ) -> Result<MessageTimer, String>
        where F: FnMut() + 'static
    {
        let closure = Closure::<dyn FnMut()>::new(callback);

        let Ok(handle) = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                timeout_ms,
            )
        else {
            return Err("failed to set timeout".to_string());
        };

        Ok(MessageTimer {
            window: window.clone(),
            handle,
            _closure: closure,
        })
    }
}

impl Drop for MessageTimer {
    fn drop(&mut self) {
        self.window.clear_timeout_with_handle(self.handle);
    }
}

fn prefers_dark(context: &Context) -> Option<bool> {
    context.window.match_media("(prefers-color-scheme: dark)")
        .ok()
        .flatten()
        .map(|query| query.matches())
}

pub fn load_theme(context: &Context) -> Theme {
    let stored = get_local_storage(context)
        .and_then(|storage| storage.get_item(theme::STORAGE_KEY).ok())
        .flatten();

    Theme::resolve(stored.as_deref(), prefers_dark(context))
}

pub fn apply_theme(context: &Context, theme: Theme) {
    if let Some(root) = context.document.document_element() {
        set_class(&root, theme::DARK_CLASS, theme.is_dark());
    }

    if let Some(body) = context.document.body() {
        set_class(&body, theme::DARK_CLASS, theme.is_dark());
    }

    if let Some(button) = context.document.get_element_by_id(THEME_TOGGLE_ID) {
        set_element_text(&button, theme.toggle_label());
    }
}

pub fn store_theme(context: &Context, theme: Theme) {
    let Some(local_storage) = get_local_storage(context)
    else {
        return;
    };

    if let Err(_) = local_storage.set_item(
        theme::STORAGE_KEY,
        theme.storage_value(),
    ) {
        console::log_1(&"Error saving theme".into());
    }
}

fn current_theme(context: &Context) -> Theme {
    let is_dark = context.document.document_element()
        .map(|root| root.class_list().contains(theme::DARK_CLASS))
        .unwrap_or(false);

    if is_dark {
        Theme::Dark
    } else {
        Theme::Light
    }
}

/// Switches to the other theme and remembers the choice
pub fn toggle_theme(context: &Context) {
    let theme = current_theme(context).toggled();

    apply_theme(context, theme);
    store_theme(context, theme);
}

/// Applies the initial theme and makes the toggle button work. The
/// returned closure must be kept alive for as long as the page.
pub fn init_theme(context: &Context) -> EventClosure {
    apply_theme(context, load_theme(context));

    let closure_context = context.clone();

    let closure = EventClosure::new(move |_event: JsValue| {
        toggle_theme(&closure_context);
    });

    context.add_click_listener(THEME_TOGGLE_ID, &closure);

    closure
}

// DOM updates for the join screen and HUD
use protocol::Color;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlButtonElement, HtmlInputElement};

use crate::game::Notice;

pub const JOIN_SCREEN_ID: &str = "joinScreen";
pub const NAME_INPUT_ID: &str = "nameInput";
pub const COLOR_INPUT_ID: &str = "colorInput";
pub const JOIN_BUTTON_ID: &str = "joinButton";
pub const JOIN_ERROR_ID: &str = "joinError";
pub const HUD_ID: &str = "hud";

const HIDDEN: &str = "hidden";

pub fn join_button_label(connected: bool) -> &'static str {
    if connected { "Play" } else { "Connecting..." }
}

/// Input types that take typed text. Keys pressed in these never steer.
pub fn is_text_input_type(input_type: &str) -> bool {
    matches!(
        input_type.to_ascii_lowercase().as_str(),
        "" | "text" | "search" | "email" | "password" | "url" | "tel" | "number"
    )
}

/// HUD size readout: the radius, rounded.
pub fn format_size(radius: f32) -> String {
    format!("{}", radius.max(0.0).round())
}

pub struct Ui {
    document: Document,
    join_screen: Element,
    name_input: HtmlInputElement,
    color_input: HtmlInputElement,
    join_button: HtmlButtonElement,
    join_error: Element,
    hud: Element,
}

impl Ui {
    pub fn new(document: Document) -> Result<Self, JsValue> {
        let find = |id: &str| -> Result<Element, JsValue> {
            document
                .get_element_by_id(id)
                .ok_or_else(|| JsValue::from_str(&format!("#{id} not found")))
        };
        Ok(Self {
            join_screen: find(JOIN_SCREEN_ID)?,
            name_input: find(NAME_INPUT_ID)?.dyn_into()?,
            color_input: find(COLOR_INPUT_ID)?.dyn_into()?,
            join_button: find(JOIN_BUTTON_ID)?.dyn_into()?,
            join_error: find(JOIN_ERROR_ID)?,
            hud: find(HUD_ID)?,
            document,
        })
    }

    pub fn join_button(&self) -> &HtmlButtonElement {
        &self.join_button
    }

    pub fn name_input(&self) -> &HtmlInputElement {
        &self.name_input
    }

    /// Current form contents. An unparsable color falls back to `fallback`.
    pub fn form(&self, fallback: Color) -> (String, Color) {
        let color = Color::from_hex(&self.color_input.value()).unwrap_or(fallback);
        (self.name_input.value(), color)
    }

    pub fn set_color(&self, color: Color) {
        self.color_input.set_value(&color.to_hex());
    }

    pub fn apply(&self, notice: &Notice) {
        match notice {
            Notice::Connectivity(connected) => self.set_connected(*connected),
            Notice::JoinError(e) => self.show_error(&e.to_string()),
            Notice::Joined(_) => self.show_game(),
            Notice::Stats { name, score, radius } => self.update_stats(name, *score, *radius),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.join_button.set_disabled(!connected);
        self.join_button.set_text_content(Some(join_button_label(connected)));
    }

    fn show_error(&self, message: &str) {
        self.join_error.set_text_content(Some(message));
        set_hidden(&self.join_error, false);
    }

    fn show_game(&self) {
        self.join_error.set_text_content(None);
        set_hidden(&self.join_error, true);
        set_hidden(&self.join_screen, true);
        set_hidden(&self.hud, false);
        let _ = self.name_input.blur();
    }

    fn update_stats(&self, name: &str, score: u32, radius: f32) {
        let fields = [
            ("hudName", name.to_string()),
            ("hudScore", score.to_string()),
            ("hudSize", format_size(radius)),
        ];
        for (id, text) in fields {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(&text));
            }
        }
    }
}

fn set_hidden(el: &Element, hidden: bool) {
    let class_list = el.class_list();
    let _ = if hidden {
        class_list.add_1(HIDDEN)
    } else {
        class_list.remove_1(HIDDEN)
    };
}

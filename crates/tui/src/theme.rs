use ratatui::style::Color;

/// Runtime-selected palette. The choice persists in the UI state file and
/// flips with the theme key, so there is no global constant to reach for:
/// the active `Theme` lives on the `App` and is passed where needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    name: &'static str,
    pub border_focus: Color,
    pub border_inactive: Color,
    pub chat_border: Color,
    pub title_fg: Color,
    pub user_fg: Color,
    pub assistant_fg: Color,
    pub error_fg: Color,
    pub digest_fg: Color,
    pub hint_fg: Color,
    pub sidebar_selected_fg: Color,
    pub sidebar_selected_bg: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Theme {
            name: "dark",
            border_focus: Color::Cyan,
            border_inactive: Color::DarkGray,
            chat_border: Color::DarkGray,
            title_fg: Color::Yellow,
            user_fg: Color::Green,
            assistant_fg: Color::Magenta,
            error_fg: Color::Red,
            digest_fg: Color::Cyan,
            hint_fg: Color::DarkGray,
            sidebar_selected_fg: Color::Black,
            sidebar_selected_bg: Color::Cyan,
        }
    }

    pub fn light() -> Self {
        Theme {
            name: "light",
            border_focus: Color::Blue,
            border_inactive: Color::Gray,
            chat_border: Color::Gray,
            title_fg: Color::Blue,
            user_fg: Color::Green,
            assistant_fg: Color::Magenta,
            error_fg: Color::Red,
            digest_fg: Color::Blue,
            hint_fg: Color::Gray,
            sidebar_selected_fg: Color::White,
            sidebar_selected_bg: Color::Blue,
        }
    }

    pub fn named(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn toggled(&self) -> Self {
        if self.name == "dark" {
            Self::light()
        } else {
            Self::dark()
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_falls_back_to_dark() {
        assert_eq!(Theme::named("light").name(), "light");
        assert_eq!(Theme::named("dark").name(), "dark");
        assert_eq!(Theme::named("solarized").name(), "dark");
    }

    #[test]
    fn toggle_flips_both_ways() {
        assert_eq!(Theme::dark().toggled().name(), "light");
        assert_eq!(Theme::light().toggled().name(), "dark");
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MobileMenu {
    open: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTarget {
    Menu,
    Hamburger,
    Outside,
}

impl MobileMenu {
    pub fn is_open(self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }

    pub fn on_document_key(&mut self, key: &str) -> bool {
        key == "Escape" && self.close()
    }

    pub fn on_hamburger_key(&mut self, key: &str) -> bool {
        if matches!(key, "Enter" | " ") {
            self.toggle();
            return true;
        }
        false
    }

    pub fn on_document_click(&mut self, target: ClickTarget) -> bool {
        target == ClickTarget::Outside && self.close()
    }

    pub fn on_resize(&mut self, width: f64, breakpoint: f64) -> bool {
        width > breakpoint && self.close()
    }

    pub fn body_overflow(self) -> &'static str {
        if self.open {
            "hidden"
        } else {
            "auto"
        }
    }

    pub fn toggle_label(self) -> &'static str {
        if self.open {
            "Close navigation menu"
        } else {
            "Open navigation menu"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened() -> MobileMenu {
        let mut menu = MobileMenu::default();
        menu.toggle();
        menu
    }

    #[test]
    fn toggle_locks_body_scroll() {
        let mut menu = MobileMenu::default();
        assert_eq!(menu.body_overflow(), "auto");

        menu.toggle();
        assert!(menu.is_open());
        assert_eq!(menu.body_overflow(), "hidden");

        menu.toggle();
        assert_eq!(menu.body_overflow(), "auto");
    }

    #[test]
    fn escape_closes_only_an_open_menu() {
        let mut menu = opened();
        assert!(!menu.on_document_key("Tab"));
        assert!(menu.on_document_key("Escape"));
        assert!(!menu.is_open());
        assert!(!menu.on_document_key("Escape"));
    }

    #[test]
    fn hamburger_keys_toggle() {
        let mut menu = MobileMenu::default();
        assert!(menu.on_hamburger_key("Enter"));
        assert!(menu.is_open());
        assert!(menu.on_hamburger_key(" "));
        assert!(!menu.is_open());
        assert!(!menu.on_hamburger_key("a"));
    }

    #[test]
    fn clicks_outside_close_the_menu() {
        let mut menu = opened();
        assert!(!menu.on_document_click(ClickTarget::Menu));
        assert!(!menu.on_document_click(ClickTarget::Hamburger));
        assert!(menu.is_open());
        assert!(menu.on_document_click(ClickTarget::Outside));
        assert!(!menu.is_open());
    }

    #[test]
    fn desktop_width_closes_the_menu() {
        let mut menu = opened();
        assert!(!menu.on_resize(768.0, 768.0));
        assert!(menu.is_open());
        assert!(menu.on_resize(1_024.0, 768.0));
        assert!(!menu.is_open());
    }
}

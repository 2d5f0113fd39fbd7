//! Viewer menus

use crate::state::AppAction;

/// One entry of a menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub action: AppAction,
}

/// A named menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub name: String,
    pub items: Vec<MenuItem>,
}

/// Registered menus, in registration order
#[derive(Debug, Clone, Default)]
pub struct MenuBar {
    menus: Vec<Menu>,
}

impl MenuBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty menu (no-op if it already exists)
    pub fn add_menu(&mut self, name: &str) {
        if self.menu(name).is_none() {
            self.menus.push(Menu {
                name: name.to_string(),
                items: Vec::new(),
            });
        }
    }

    /// Append an item to a menu, creating the menu if needed
    pub fn add_function_to_menu(&mut self, menu: &str, label: &str, action: AppAction) {
        self.add_menu(menu);
        if let Some(entry) = self.menus.iter_mut().find(|m| m.name == menu) {
            entry.items.push(MenuItem {
                label: label.to_string(),
                action,
            });
        }
    }

    pub fn menu(&self, name: &str) -> Option<&Menu> {
        self.menus.iter().find(|m| m.name == name)
    }

    pub fn menus(&self) -> &[Menu] {
        &self.menus
    }

    /// Action for a command word: a menu name runs its first item, an item
    /// label runs that item
    pub fn lookup(&self, command: &str) -> Option<AppAction> {
        if let Some(item) = self.menu(command).and_then(|m| m.items.first()) {
            return Some(item.action.clone());
        }
        self.menus
            .iter()
            .flat_map(|m| m.items.iter())
            .find(|item| item.label == command)
            .map(|item| item.action.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_menu_and_label() {
        let mut bar = MenuBar::new();
        bar.add_menu("recognition");
        bar.add_function_to_menu("recognition", "recognize_batch", AppAction::RunRecognition);
        bar.add_function_to_menu("view", "faces", AppAction::ListFaces);

        assert_eq!(bar.menus().len(), 2);
        assert_eq!(bar.lookup("recognition"), Some(AppAction::RunRecognition));
        assert_eq!(bar.lookup("recognize_batch"), Some(AppAction::RunRecognition));
        assert_eq!(bar.lookup("faces"), Some(AppAction::ListFaces));
        assert_eq!(bar.lookup("missing"), None);
    }

    #[test]
    fn test_empty_menu_has_no_action() {
        let mut bar = MenuBar::new();
        bar.add_menu("recognition");
        bar.add_menu("recognition");

        assert_eq!(bar.menus().len(), 1);
        assert_eq!(bar.lookup("recognition"), None);
    }
}

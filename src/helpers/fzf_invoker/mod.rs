use std::fmt::Display;
use std::io;
use termenu::{Item, Menu};

pub struct FzfInvoker<T> {
    msg: String,
    items: Vec<T>,
}

impl<T> FzfInvoker<T>
where
    T: Display + Clone,
{
    pub fn new(msg: String, items: Vec<T>) -> Self {
        Self { msg, items }
    }

    /// Show an fzf-like menu and return the selected item (cloned), or `None`
    /// if the user backed out.
    pub fn invoke(&self) -> io::Result<Option<T>> {
        let mut menu = Menu::new().map_err(|e| io::Error::other(e.to_string()))?;

        let list: Vec<Item<usize>> = self
            .items
            .iter()
            .enumerate()
            .map(|(idx, item)| Item::new(&item.to_string(), idx))
            .collect();

        let selected = menu
            .set_title(self.msg.as_str())
            .add_list(list)
            .select()
            .map_err(|e| io::Error::other(e.to_string()))?;

        Ok(selected.and_then(|idx| self.items.get(*idx).cloned()))
    }
}

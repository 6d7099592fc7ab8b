//! Record types shared by the unit tests.

use crate::{path::Tree, record::Presence};
use dtokit_derive::Record;

///
/// Brand
///

#[derive(Clone, Debug, Default, PartialEq, Record)]
pub(crate) struct Brand {
    pub(crate) id: u64,
    pub(crate) name: String,
    pub(crate) category: String,
    pub(crate) meta: Tree,
    pub(crate) presence: Presence,
}

impl Brand {
    pub(crate) fn new(id: u64, name: &str, category: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            category: category.to_string(),
            meta: Tree::Null,
            presence: Presence::Untracked,
        }
    }
}

///
/// Product
///
/// Exercises rename, skip, setters and a non-default record name.
///

#[derive(Clone, Debug, Default, Record)]
#[record(
    name = "ListProduct",
    setter(field = "title", with = "Self::set_title", getter = "Self::title")
)]
pub(crate) struct Product {
    pub(crate) id: u64,
    #[record(rename = "parent")]
    pub(crate) parent_id: Option<u64>,
    pub(crate) count: i64,
    pub(crate) active: bool,
    pub(crate) label: String,
    pub(crate) brand: Option<String>,
    #[record(skip)]
    pub(crate) title_upper: String,
    pub(crate) tracking: Presence,
}

impl Product {
    fn set_title(&mut self, title: String) {
        self.title_upper = title.to_uppercase();
    }

    fn title(&self) -> &str {
        &self.title_upper
    }
}

//! Word definition lookup and the saved-word list

mod lookup;
mod wordlist;

pub use lookup::{Definition, DictionaryClient, MeaningGroup};
pub use wordlist::{SavedWord, WordListStore};

//! The input method's side of the core.
//!
//! A front end turns touches into [`Intent`]s and hands them to
//! [`InputCore::dispatch`]. Everything but a long press passes straight
//! through as a [`Reaction`] for the front end to apply to the text field.

use crate::codepoint_ty::Codepoint;
use crate::error::{Error, Result};
use crate::favorites::FavoritesStore;
use crate::model::Favorite;
use log::debug;
use std::slice::Chunks;
use std::sync::Arc;

/// Number of keys in one keyboard row.
pub const KEYS_PER_ROW: usize = 8;

/// Splits a group's characters into keyboard rows of [`KEYS_PER_ROW`] keys.
/// Only the last row may be shorter.
pub fn rows<T>(keys: &[T]) -> Chunks<'_, T> {
    keys.chunks(KEYS_PER_ROW)
}

/// What the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// A character key was tapped; carries the key's text.
    KeyPressed(String),
    /// The delete key was tapped.
    DeletePressed,
    /// The enter key was tapped.
    EnterPressed,
    /// A character key was held down.
    LongPressed(Codepoint),
}

/// What the front end should do in response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    /// Insert this text at the cursor.
    Commit(String),
    /// Delete the character before the cursor.
    DeleteBackward,
    /// Send the editor action.
    Enter,
    /// The codepoint was added to the favorites.
    Favorited(Favorite),
    /// The codepoint was already a favorite; nothing changed.
    AlreadyFavorite(Codepoint),
}

/// Routes intents to the favorites store.
#[derive(Debug, Clone)]
pub struct InputCore {
    favorites: Arc<FavoritesStore>,
}

impl InputCore {
    /// Creates a core that records long presses in `favorites`.
    pub fn new(favorites: Arc<FavoritesStore>) -> Self {
        InputCore { favorites }
    }

    /// The favorites store long presses go to.
    pub fn favorites(&self) -> &Arc<FavoritesStore> {
        &self.favorites
    }

    /// Reacts to one intent.
    ///
    /// A repeated long press is not an error; it reports
    /// [`Reaction::AlreadyFavorite`]. Storage failures are returned as-is.
    pub fn dispatch(&self, intent: Intent) -> Result<Reaction> {
        match intent {
            Intent::KeyPressed(text) => Ok(Reaction::Commit(text)),
            Intent::DeletePressed => Ok(Reaction::DeleteBackward),
            Intent::EnterPressed => Ok(Reaction::Enter),
            Intent::LongPressed(codepoint) => match self.favorites.add(codepoint) {
                Ok(favorite) => {
                    debug!("long press favorited {}", codepoint);
                    Ok(Reaction::Favorited(favorite))
                }
                Err(Error::AlreadyFavorite(codepoint)) => Ok(Reaction::AlreadyFavorite(codepoint)),
                Err(e) => Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> InputCore {
        InputCore::new(Arc::new(FavoritesStore::in_memory()))
    }

    #[test]
    fn test_pass_through_intents() {
        let core = core();
        assert_eq!(
            core.dispatch(Intent::KeyPressed("\u{1F600}".into())).unwrap(),
            Reaction::Commit("\u{1F600}".into())
        );
        assert_eq!(core.dispatch(Intent::DeletePressed).unwrap(), Reaction::DeleteBackward);
        assert_eq!(core.dispatch(Intent::EnterPressed).unwrap(), Reaction::Enter);
        assert!(core.favorites().is_empty());
    }

    #[test]
    fn test_long_press_favorites_once() {
        let core = core();
        let cp = Codepoint::from('\u{2764}');
        match core.dispatch(Intent::LongPressed(cp)).unwrap() {
            Reaction::Favorited(favorite) => assert_eq!(favorite.codepoint, cp),
            other => panic!("unexpected reaction {:?}", other),
        }
        assert_eq!(
            core.dispatch(Intent::LongPressed(cp)).unwrap(),
            Reaction::AlreadyFavorite(cp)
        );
        assert_eq!(core.favorites().len(), 1);
    }

    #[test]
    fn test_rows() {
        let keys: Vec<u32> = (0..19).collect();
        let lens: Vec<_> = rows(&keys).map(<[u32]>::len).collect();
        assert_eq!(lens, [8, 8, 3]);
        assert_eq!(rows::<u32>(&[]).count(), 0);
    }
}

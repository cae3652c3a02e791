pub mod store;
pub mod types;
pub mod view;

pub use store::GalleryStore;
pub use types::GenerationRecord;
pub use view::{DetailView, GalleryEntry, ViewSelection};

use crate::error::{AppError, AppResult};

/// Resolves a position coming from the user into an index, rejecting rather than clamping.
pub fn checked_position(position: i64, len: usize) -> AppResult<usize> {
    usize::try_from(position)
        .ok()
        .filter(|index| *index < len)
        .ok_or(AppError::InvalidPosition { position, len })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_position() {
        assert_eq!(checked_position(0, 2).unwrap(), 0);
        assert_eq!(checked_position(1, 2).unwrap(), 1);
        assert!(matches!(
            checked_position(2, 2),
            Err(AppError::InvalidPosition { position: 2, len: 2 })
        ));
        assert!(matches!(
            checked_position(-1, 2),
            Err(AppError::InvalidPosition { position: -1, .. })
        ));
        assert!(checked_position(0, 0).is_err());
    }
}

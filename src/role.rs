//! Role ids shared with the view layer.
//!
//! Ids below [`USER_ROLE`] are reserved by the UI framework. Every column of
//! the bound table gets its own role, starting at [`FIRST_COLUMN_ROLE`] and
//! following column order.

/// Plain display representation of a cell.
pub const DISPLAY_ROLE: i32 = 0;
/// Editable representation of a cell.
pub const EDIT_ROLE: i32 = 2;
/// Whether the row is checked (selected) in the view.
pub const CHECK_STATE_ROLE: i32 = 10;
/// First id not reserved by the framework.
pub const USER_ROLE: i32 = 0x0100;
/// Role of column 0. One slot after [`USER_ROLE`] is left unused.
pub const FIRST_COLUMN_ROLE: i32 = USER_ROLE + 1;

/// Name the view uses for [`CHECK_STATE_ROLE`].
pub const CHECK_STATE_NAME: &str = "checkState";

pub fn is_reserved(role: i32) -> bool {
    role < USER_ROLE
}

/// Column addressed by `role`, or `None` for reserved roles and the unused
/// slot at [`USER_ROLE`].
pub fn column_for_role(role: i32) -> Option<usize> {
    if role < FIRST_COLUMN_ROLE {
        return None;
    }
    usize::try_from(role - FIRST_COLUMN_ROLE).ok()
}

pub fn role_for_column(column: usize) -> i32 {
    FIRST_COLUMN_ROLE + column as i32
}

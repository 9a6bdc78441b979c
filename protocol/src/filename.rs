/// Longest filename, in bytes, a peer may publish.
pub const MAX_FILENAME_LENGTH: usize = 255;

const FORBIDDEN: [char; 5] = ['/', '\\', '\0', '\n', '\r'];

/// A publishable name is non-empty, at most [`MAX_FILENAME_LENGTH`] bytes and
/// names a single file: no path separators, NUL or line breaks, and not one
/// of the `.` and `..` directory entries.
pub fn is_valid_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name.len() <= MAX_FILENAME_LENGTH
        && !name.contains(FORBIDDEN)
}

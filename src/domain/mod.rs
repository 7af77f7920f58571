// Request payloads and the rules they must satisfy before reaching storage

pub mod note;
pub mod user;
pub mod validation;

pub use note::{parse_note_id, NoteInput, NoteRequest, NotesFilter, NotesQuery};
pub use user::{
    ChangePasswordRequest, Credentials, LoginRequest, NewUser, PasswordChange, ProfileUpdate,
    RegisterRequest, UpdateProfileRequest,
};

pub mod contact;
pub mod user;

pub use contact::Contact;
pub use user::User;

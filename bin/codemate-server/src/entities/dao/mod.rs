pub mod code;
pub mod session;
pub mod user;

pub use code::CodeRecord;
pub use session::LoginSession;
pub use user::UserRecord;

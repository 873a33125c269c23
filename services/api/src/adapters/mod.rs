pub mod assets;
pub mod db;
pub mod invites;

pub use assets::FsAssetStore;
pub use db::PgAdapter;
pub use invites::LoggedInvitationSender;

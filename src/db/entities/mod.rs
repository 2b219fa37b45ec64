//! SeaORM entities for the journal tables.

pub mod entry;
pub mod entry_tag;
pub mod tag;
pub mod user;

pub mod prelude {
    pub use super::user::Entity as User;
    pub use super::user::Model as UserModel;
    pub use super::user::ActiveModel as UserActiveModel;
    pub use super::user::Column as UserColumn;

    pub use super::entry::Entity as Entry;
    pub use super::entry::Model as EntryModel;
    pub use super::entry::ActiveModel as EntryActiveModel;
    pub use super::entry::Column as EntryColumn;

    pub use super::tag::Entity as Tag;
    pub use super::tag::Model as TagModel;
    pub use super::tag::ActiveModel as TagActiveModel;
    pub use super::tag::Column as TagColumn;

    pub use super::entry_tag::Entity as EntryTag;
    pub use super::entry_tag::Model as EntryTagModel;
    pub use super::entry_tag::ActiveModel as EntryTagActiveModel;
    pub use super::entry_tag::Column as EntryTagColumn;
}

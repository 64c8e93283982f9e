pub mod email;
pub mod waitlist_entry;

use crate::scan::Cursor;
use std::path::PathBuf;

pub mod object_check;
pub mod object_delete;
pub mod object_link;
pub mod object_list;
pub mod object_put;

#[derive(Debug)]
pub enum Action {
    PutObject {
        /// `None` reads from STDIN
        file: Option<PathBuf>,
        file_name: String,
        group: Option<String>,
        owner: Option<String>,
    },
    ListObjects {
        prefix: Option<String>,
        token: Option<String>,
        max_keys: u32,
    },
    ListUnlinked {
        prefix: Option<String>,
        cursor: Cursor,
        max_keys: u32,
    },
    ListRecords,
    LinkObjects {
        keys: Vec<String>,
        group: Option<String>,
        owner: Option<String>,
    },
    DeleteRecord {
        name: String,
    },
    UnlinkRecord {
        name: String,
    },
    CheckDestination,
}

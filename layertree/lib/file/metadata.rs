use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use getset::Getters;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use super::FilePath;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const S_IFMT: u32 = 0o170000;
const S_IFSOCK: u32 = 0o140000;
const S_IFLNK: u32 = 0o120000;
const S_IFREG: u32 = 0o100000;
const S_IFBLK: u32 = 0o060000;
const S_IFDIR: u32 = 0o040000;
const S_IFCHR: u32 = 0o020000;
const S_IFIFO: u32 = 0o010000;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The type of a file as described by an archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileType {
    /// A regular file
    Regular,

    /// A hardlink to another entry in the same layer
    HardLink,

    /// A symbolic link
    SymLink,

    /// A character device
    CharacterDevice,

    /// A block device
    BlockDevice,

    /// A directory
    Directory,

    /// A named pipe
    Fifo,

    /// A unix domain socket
    Socket,

    /// Anything the mode bits do not describe
    Irregular,
}

/// The metadata of a single archive entry in a layer.
///
/// Only `path` and `file_type` are required, the remaining fields default to empty values.
#[derive(Debug, Clone, PartialEq, Eq, Getters, TypedBuilder, Serialize, Deserialize)]
#[getset(get = "pub with_prefix")]
pub struct Metadata {
    /// The path the entry is described at
    #[builder(setter(into))]
    path: FilePath,

    /// The type of the entry
    file_type: FileType,

    /// The raw target of a link entry
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    link_destination: Option<String>,

    /// The size of the entry in bytes
    #[builder(default)]
    #[serde(default)]
    size: u64,

    /// The permission and type bits of the entry
    #[builder(default)]
    #[serde(default)]
    mode: u32,

    /// The owning user id
    #[builder(default)]
    #[serde(default)]
    uid: u32,

    /// The owning group id
    #[builder(default)]
    #[serde(default)]
    gid: u32,

    /// The last modification time of the entry
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mod_time: Option<DateTime<Utc>>,

    /// The detected MIME type of the content
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl FileType {
    /// Derives the file type from the type bits of a unix mode.
    pub fn from_mode(mode: u32) -> Self {
        match mode & S_IFMT {
            S_IFSOCK => FileType::Socket,
            S_IFLNK => FileType::SymLink,
            S_IFREG => FileType::Regular,
            S_IFBLK => FileType::BlockDevice,
            S_IFDIR => FileType::Directory,
            S_IFCHR => FileType::CharacterDevice,
            S_IFIFO => FileType::Fifo,
            _ => FileType::Irregular,
        }
    }

    /// Returns `true` for symlinks and hardlinks.
    pub fn is_link(&self) -> bool {
        matches!(self, FileType::SymLink | FileType::HardLink)
    }
}

impl Metadata {
    /// Returns `true` if the entry is a whiteout marker.
    pub fn is_whiteout(&self) -> bool {
        self.path.is_whiteout()
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileType::Regular => "regular file",
            FileType::HardLink => "hardlink",
            FileType::SymLink => "symlink",
            FileType::CharacterDevice => "character device",
            FileType::BlockDevice => "block device",
            FileType::Directory => "directory",
            FileType::Fifo => "fifo",
            FileType::Socket => "socket",
            FileType::Irregular => "irregular file",
        };

        write!(f, "{name}")
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

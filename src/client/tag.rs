//! Message kind discriminator carried in the first byte of every broadcast.

use std::fmt;

/// Kind of broadcast message, so it can be rendered appropriately on
/// reception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// A normal chat message.
    Default,
    /// The sender has joined the channel.
    Join,
    /// The sender has left the channel.
    Exit,
    /// The sender holds the channel's admin key and sent asymmetrically.
    Admin,
}

impl Tag {
    pub fn as_byte(self) -> u8 {
        match self {
            Tag::Default => 0,
            Tag::Join => 1,
            Tag::Exit => 2,
            Tag::Admin => 3,
        }
    }
}

impl TryFrom<u8> for Tag {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(Tag::Default),
            1 => Ok(Tag::Join),
            2 => Ok(Tag::Exit),
            3 => Ok(Tag::Admin),
            other => Err(other),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tag::Default => "default",
            Tag::Join => "join",
            Tag::Exit => "exit",
            Tag::Admin => "admin",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_bytes() {
        for tag in [Tag::Default, Tag::Join, Tag::Exit, Tag::Admin] {
            assert_eq!(Tag::try_from(tag.as_byte()), Ok(tag));
        }
        assert_eq!(Tag::try_from(4), Err(4));
        assert_eq!(Tag::try_from(255), Err(255));
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(Tag::Default.to_string(), "default");
        assert_eq!(Tag::Admin.to_string(), "admin");
    }
}

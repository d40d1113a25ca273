use byteorder::{ByteOrder, LittleEndian};

pub const USERNAME_MAX_LENGTH: usize = 32;
pub const EMAIL_MAX_LENGTH: usize = 255;
pub const FILENAME_MAX_LENGTH: usize = 255;

const ID_SIZE: usize = 4;
const USERNAME_SIZE: usize = USERNAME_MAX_LENGTH + 1;
const EMAIL_SIZE: usize = EMAIL_MAX_LENGTH + 1;
const USERNAME_OFFSET: usize = ID_SIZE;
const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;
pub const USER_ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

/// A single record: a 32-bit id plus two null-terminated, bounded-length
/// string fields. This is the only value type the tree stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: u32,
    pub username: String,
    pub email: String,
}

impl UserRow {
    pub fn new(id: u32, username: impl Into<String>, email: impl Into<String>) -> Self {
        UserRow {
            id,
            username: username.into(),
            email: email.into(),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![0u8; USER_ROW_SIZE];
        LittleEndian::write_u32(&mut buf[0..ID_SIZE], self.id);
        write_string(&mut buf, USERNAME_OFFSET, &self.username, USERNAME_SIZE);
        write_string(&mut buf, EMAIL_OFFSET, &self.email, EMAIL_SIZE);
        buf
    }

    pub fn deserialize(buf: &[u8]) -> UserRow {
        let id = LittleEndian::read_u32(&buf[0..ID_SIZE]);
        let username = read_string(buf, USERNAME_OFFSET, USERNAME_SIZE);
        let email = read_string(buf, EMAIL_OFFSET, EMAIL_SIZE);
        UserRow { id, username, email }
    }

    pub fn print(&self) -> String {
        format!("({}, {}, {})", self.id, self.username, self.email)
    }
}

fn write_string(buf: &mut [u8], pos: usize, s: &str, field_len: usize) {
    let bytes = s.as_bytes();
    let n = bytes.len().min(field_len - 1);
    buf[pos..pos + n].copy_from_slice(&bytes[..n]);
    for b in &mut buf[pos + n..pos + field_len] {
        *b = 0;
    }
}

fn read_string(buf: &[u8], pos: usize, field_len: usize) -> String {
    let slice = &buf[pos..pos + field_len];
    let end = slice.iter().position(|&b| b == 0).unwrap_or(field_len);
    String::from_utf8_lossy(&slice[..end]).into_owned()
}

/// Which field an `update` statement targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateField {
    Username,
    Email,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePayload {
    pub id: u32,
    pub field: UpdateField,
    pub new_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_short_fields() {
        let row = UserRow::new(7, "alice", "alice@example.com");
        let buf = row.serialize();
        assert_eq!(buf.len(), USER_ROW_SIZE);
        let back = UserRow::deserialize(&buf);
        assert_eq!(row, back);
    }

    #[test]
    fn truncates_strings_at_max_length() {
        let long_username = "a".repeat(USERNAME_MAX_LENGTH);
        let row = UserRow::new(1, long_username.clone(), "e@x");
        let buf = row.serialize();
        let back = UserRow::deserialize(&buf);
        assert_eq!(back.username, long_username);
    }

    #[test]
    fn print_format_matches_reference() {
        let row = UserRow::new(1, "bob", "bob@x.com");
        assert_eq!(row.print(), "(1, bob, bob@x.com)");
    }
}

/// Database row types, mapped directly from SQLite rows.
/// Distinct from gramalisis-types models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub job: String,
    pub photo_url: String,
    pub level: u32,
    pub created_at: String,
}

pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub job: &'a str,
}

/// Editable profile columns.
pub struct ProfileColumns<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub job: &'a str,
    pub photo_url: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRow {
    pub id: String,
    pub uid: String,
    pub text: String,
    pub summary: String,
    pub created_at: String,
}

//! Offers table definition

/// Stored columns in insert order, excluding the surrogate `id`
pub const OFFER_COLUMNS: [&str; 21] = [
    "slug",
    "title",
    "requiredSkills",
    "niceToHaveSkills",
    "workplaceType",
    "workingTime",
    "experienceLevel",
    "employmentTypes",
    "categoryId",
    "multilocation",
    "city",
    "street",
    "latitude",
    "longitude",
    "remoteInterview",
    "companyName",
    "companyLogoThumbUrl",
    "publishedAt",
    "openToHireUkrainians",
    "languages",
    "date_fetched",
];

/// `CREATE TABLE IF NOT EXISTS` statement for the offers table
///
/// `table` must already be a validated identifier.
pub fn create_table_sql(table: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS "{table}" (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT,
    title TEXT,
    requiredSkills TEXT,
    niceToHaveSkills TEXT,
    workplaceType TEXT,
    workingTime TEXT,
    experienceLevel TEXT,
    employmentTypes TEXT,
    categoryId INTEGER,
    multilocation TEXT,
    city TEXT,
    street TEXT,
    latitude TEXT,
    longitude TEXT,
    remoteInterview BOOLEAN,
    companyName TEXT,
    companyLogoThumbUrl TEXT,
    publishedAt TEXT,
    openToHireUkrainians BOOLEAN,
    languages TEXT,
    date_fetched TEXT
);
"#
    )
}

/// `INSERT` statement covering every column in [`OFFER_COLUMNS`]
pub(crate) fn insert_sql(table: &str) -> String {
    let placeholders: Vec<String> = (1..=OFFER_COLUMNS.len()).map(|i| format!("?{i}")).collect();
    format!(
        r#"INSERT INTO "{table}" ({}) VALUES ({})"#,
        OFFER_COLUMNS.join(", "),
        placeholders.join(", ")
    )
}

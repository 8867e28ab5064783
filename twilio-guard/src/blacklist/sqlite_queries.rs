pub const QUERY_CREATE_CALLERS: &str = r#"
CREATE TABLE IF NOT EXISTS callers (
    phone_number VARCHAR(20) PRIMARY KEY NOT NULL,
    blacklisted BOOLEAN NOT NULL DEFAULT 0
);
"#;

pub const QUERY_IS_BLACKLISTED: &str = r#"
SELECT blacklisted FROM callers WHERE phone_number=$1;
"#;

pub const QUERY_UPSERT_CALLER: &str = r#"
INSERT INTO callers (phone_number, blacklisted)
VALUES ($1, $2)
ON CONFLICT(phone_number) DO UPDATE SET blacklisted=excluded.blacklisted;
"#;

pub const QUERY_DELETE_CALLER: &str = r#"
DELETE FROM callers WHERE phone_number=$1;
"#;

pub const QUERY_LIST_CALLERS: &str = r#"
SELECT phone_number, blacklisted FROM callers ORDER BY phone_number;
"#;

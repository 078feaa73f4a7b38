#![allow(dead_code)]

use jobly::{JoblyResult, PasswordHasher};
use tokio_postgres::{Client, NoTls};

const SCHEMA_DDL: &str = r#"
CREATE TABLE companies (
    handle VARCHAR(25) PRIMARY KEY CHECK (handle = lower(handle)),
    name TEXT UNIQUE NOT NULL,
    num_employees INTEGER CHECK (num_employees >= 0),
    description TEXT NOT NULL,
    logo_url TEXT
);

CREATE TABLE jobs (
    id SERIAL PRIMARY KEY,
    title TEXT NOT NULL,
    salary INTEGER CHECK (salary >= 0),
    equity NUMERIC CHECK (equity <= 1.0),
    company_handle VARCHAR(25) NOT NULL REFERENCES companies ON DELETE CASCADE
);

CREATE TABLE users (
    username VARCHAR(25) PRIMARY KEY,
    password TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL CHECK (position('@' IN email) > 1),
    is_admin BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE TABLE applications (
    username VARCHAR(25) REFERENCES users ON DELETE CASCADE,
    job_id INTEGER REFERENCES jobs ON DELETE CASCADE,
    PRIMARY KEY (username, job_id)
);

INSERT INTO companies (handle, name, num_employees, description, logo_url) VALUES
    ('c1', 'C1', 1, 'Desc1', 'http://c1.img'),
    ('c2', 'C2', 2, 'Desc2', 'http://c2.img'),
    ('c3', 'C3', 3, 'Desc3', 'http://c3.img');

INSERT INTO jobs (title, salary, equity, company_handle) VALUES
    ('J1', 100, 0.1, 'c1'),
    ('J2', 200, 0.2, 'c1'),
    ('J3', 300, 0, 'c1'),
    ('J4', NULL, NULL, 'c1');

INSERT INTO users (username, password, first_name, last_name, email, is_admin) VALUES
    ('u1', 'hashed:password1', 'U1F', 'U1L', 'u1@email.com', FALSE),
    ('u2', 'hashed:password2', 'U2F', 'U2L', 'u2@email.com', FALSE);
"#;

/// A connection whose search path points at a private, seeded schema.
pub struct TestDb {
    pub client: Client,
    schema: String,
}

impl TestDb {
    /// Seeded job ids, in title order (J1..J4).
    pub async fn job_ids(&self) -> Vec<i32> {
        self.client
            .query("SELECT id FROM jobs ORDER BY title", &[])
            .await
            .expect("query job ids")
            .iter()
            .map(|row| row.get(0))
            .collect()
    }

    pub async fn teardown(self) {
        self.client
            .batch_execute(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .await
            .expect("drop test schema");
    }
}

/// Connect and seed a fresh schema, or `None` when `DATABASE_URL` is unset.
pub async fn try_setup() -> Option<TestDb> {
    let database_url = std::env::var("DATABASE_URL").ok()?;
    let (client, connection) = tokio_postgres::connect(&database_url, NoTls)
        .await
        .expect("Failed to connect to DATABASE_URL with NoTls");
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("tokio-postgres connection error: {e}");
        }
    });

    let schema = format!("jobly_test_{}", uuid::Uuid::new_v4().simple());
    client
        .batch_execute(&format!("CREATE SCHEMA {schema}; SET search_path TO {schema};"))
        .await
        .expect("create test schema");
    client.batch_execute(SCHEMA_DDL).await.expect("seed test schema");

    Some(TestDb { client, schema })
}

/// Reversible stand-in for a real password hash.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> JoblyResult<String> {
        Ok(format!("hashed:{password}"))
    }

    fn verify(&self, password: &str, hashed: &str) -> JoblyResult<bool> {
        Ok(hashed.strip_prefix("hashed:") == Some(password))
    }
}

pub async fn stored_password(db: &TestDb, username: &str) -> String {
    db.client
        .query_one("SELECT password FROM users WHERE username = $1", &[&username])
        .await
        .expect("query password")
        .get(0)
}

// SQLite schema definitions
// This file mirrors schema.rs but uses SQLite-compatible types

diesel::table! {
    person (id) {
        id -> Integer,
        name -> Text,
    }
}

diesel::table! {
    employee (id) {
        id -> Integer,
        person_id -> Integer,
        salary -> BigInt,
    }
}

diesel::joinable!(employee -> person (person_id));
diesel::allow_tables_to_appear_in_same_query!(person, employee);

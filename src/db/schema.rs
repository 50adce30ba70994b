diesel::table! {
    person (id) {
        id -> BigInt,
        name -> Text,
    }
}

diesel::table! {
    employee (id) {
        id -> BigInt,
        person_id -> BigInt,
        salary -> BigInt,
    }
}

diesel::joinable!(employee -> person (person_id));
diesel::allow_tables_to_appear_in_same_query!(person, employee);

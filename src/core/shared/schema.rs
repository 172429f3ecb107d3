diesel::table! {
    users (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        password_hash -> Varchar,
        is_admin -> Bool,
        role -> Varchar,
        status -> Varchar,
        phone -> Nullable<Varchar>,
        department -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        last_login -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    tickets (id) {
        id -> Uuid,
        number -> Int8,
        title -> Varchar,
        detail -> Text,
        status -> Varchar,
        priority -> Varchar,
        #[sql_name = "type"]
        ticket_type -> Varchar,
        is_complete -> Bool,
        hidden -> Bool,
        locked -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        created_by -> Uuid,
        assigned_to -> Nullable<Uuid>,
    }
}

diesel::table! {
    comments (id) {
        id -> Uuid,
        content -> Text,
        is_internal -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        ticket_id -> Uuid,
        user_id -> Uuid,
    }
}

diesel::table! {
    time_entries (id) {
        id -> Uuid,
        description -> Text,
        hours -> Float8,
        date -> Date,
        created_at -> Timestamptz,
        ticket_id -> Uuid,
        user_id -> Uuid,
    }
}

diesel::table! {
    clients (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        contact_name -> Nullable<Varchar>,
        phone -> Nullable<Varchar>,
        notes -> Nullable<Text>,
        active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(comments -> tickets (ticket_id));
diesel::joinable!(time_entries -> tickets (ticket_id));

diesel::allow_tables_to_appear_in_same_query!(users, tickets, comments, time_entries, clients);

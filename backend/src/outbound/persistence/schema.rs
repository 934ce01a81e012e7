//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Uuid,
        /// Lower-cased; unique via `users_email_key`.
        email -> Varchar,
        password_hash -> Text,
        first_name -> Varchar,
        last_name -> Varchar,
        /// `customer` or `admin`.
        role -> Varchar,
        /// SHA-256 hex digest of the current refresh token.
        refresh_token_hash -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Catalogue products.
    products (id) {
        id -> Uuid,
        name -> Varchar,
        description -> Nullable<Text>,
        price -> Numeric,
        stock -> Int4,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Shopping carts. At most one row per user has `checked_out = false`.
    carts (id) {
        id -> Uuid,
        user_id -> Uuid,
        checked_out -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Cart lines, unique per (cart, product).
    cart_items (id) {
        id -> Uuid,
        cart_id -> Uuid,
        product_id -> Uuid,
        quantity -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Orders created at checkout.
    orders (id) {
        id -> Uuid,
        user_id -> Uuid,
        /// `pending`, `paid`, or `cancelled`.
        status -> Varchar,
        total_amount -> Numeric,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Order lines with prices captured at checkout.
    order_items (id) {
        id -> Uuid,
        order_id -> Uuid,
        product_id -> Uuid,
        product_name -> Varchar,
        quantity -> Int4,
        unit_price -> Numeric,
    }
}

diesel::table! {
    /// Recorded payments.
    payments (id) {
        id -> Uuid,
        order_id -> Uuid,
        amount -> Numeric,
        method -> Varchar,
        status -> Varchar,
        provider_reference -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(carts -> users (user_id));
diesel::joinable!(cart_items -> carts (cart_id));
diesel::joinable!(cart_items -> products (product_id));
diesel::joinable!(orders -> users (user_id));
diesel::joinable!(order_items -> orders (order_id));
diesel::joinable!(payments -> orders (order_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    products,
    carts,
    cart_items,
    orders,
    order_items,
    payments,
);

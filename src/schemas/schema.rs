diesel::table! {
    users (id) {
        id -> BigInt,
    }
}

diesel::table! {
    subscriptions (user_id, category) {
        user_id -> BigInt,
        category -> Text,
    }
}

diesel::table! {
    sent_articles (url) {
        url -> Text,
        category -> Text,
        sent_at -> BigInt,
    }
}

diesel::allow_tables_to_appear_in_same_query!(users, subscriptions, sent_articles,);

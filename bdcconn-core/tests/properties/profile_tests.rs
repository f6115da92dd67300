//! Property-based tests for connection profile identity
//!
//! The derived options key is the profile's identity; these properties pin
//! down which fields participate and that the key is deterministic.

use proptest::prelude::*;

use bdcconn_core::ConnectionProfile;

fn arb_field() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9._-]{1,16}".prop_map(|s| s)
}

proptest! {
    /// Two profiles with the same connection-defining fields share an
    /// identity; changing the server breaks it.
    #[test]
    fn key_reflects_identity_fields(
        server in arb_field(),
        database in arb_field(),
        user in arb_field(),
        other_server in arb_field(),
    ) {
        let a = ConnectionProfile::new(&server, &database, &user, "MSSQL");
        let b = ConnectionProfile::new(&server, &database, &user, "MSSQL");
        prop_assert!(a.matches(&b));

        prop_assume!(other_server != server);
        let c = ConnectionProfile::new(&other_server, &database, &user, "MSSQL");
        prop_assert!(!a.matches(&c));
    }

    /// Dialog state never participates in identity.
    #[test]
    fn key_ignores_dialog_state(
        name in arb_field(),
        password in arb_field(),
        save_profile in any::<bool>(),
        save_password in any::<bool>(),
    ) {
        let a = ConnectionProfile::new("server-1", "db", "sa", "MSSQL");
        let mut b = a.clone();
        b.connection_name = name;
        b.password = password;
        b.save_profile = save_profile;
        b.save_password = save_password;
        prop_assert!(a.matches(&b));
    }

    /// Extra options contribute to identity independent of insertion order.
    #[test]
    fn key_is_insensitive_to_option_order(
        pairs in prop::collection::vec(("[a-z]{1,6}", "[a-z0-9]{1,6}"), 0..5),
    ) {
        let mut a = ConnectionProfile::new("server-1", "db", "sa", "MSSQL");
        let mut b = a.clone();
        for (name, value) in &pairs {
            a.options.insert(name.clone(), value.clone());
        }
        for (name, value) in pairs.iter().rev() {
            b.options.insert(name.clone(), value.clone());
        }
        prop_assert!(a.matches(&b));

        let mut c = a.clone();
        c.options.insert("applicationname".to_string(), "bdcconn".to_string());
        prop_assert!(!a.matches(&c));
    }

    /// An injected security token never changes the profile's identity.
    #[test]
    fn azure_token_never_enters_the_key(token in "[A-Za-z0-9]{1,32}") {
        let a = ConnectionProfile::new("server-1", "db", "sa", "MSSQL");
        let mut b = a.clone();
        b.options.insert("azureAccountToken".to_string(), token);
        prop_assert!(a.matches(&b));
    }

    /// Profiles survive serialization unchanged.
    #[test]
    fn profile_toml_round_trip(
        server in arb_field(),
        database in arb_field(),
        user in arb_field(),
        name in arb_field(),
    ) {
        let mut profile = ConnectionProfile::new(&server, &database, &user, "MSSQL");
        profile.connection_name = name;
        profile.save_password = true;
        profile.options.insert("encrypt".to_string(), "true".to_string());

        let text = toml::to_string(&profile).unwrap();
        let restored: ConnectionProfile = toml::from_str(&text).unwrap();
        prop_assert_eq!(profile, restored);
    }
}

//! Property-based tests for terminal command lines

use std::path::Path;

use proptest::prelude::*;
use termdock_core::bridge::build_command_line;
use termdock_core::models::{Credentials, Protocol, SessionDescriptor};

// ========== Strategies ==========

fn arb_protocol() -> impl Strategy<Value = Protocol> {
    prop::sample::select(Protocol::ALL.to_vec())
}

fn arb_host() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9.-]{0,20}"
}

fn arb_password() -> impl Strategy<Value = String> {
    "[A-Za-z0-9!#%]{1,16}"
}

/// Strategy for descriptors with optional port, user, password and saved config
fn arb_descriptor() -> impl Strategy<Value = SessionDescriptor> {
    (
        arb_protocol(),
        arb_host(),
        prop::option::of(1u32..65_535),
        prop::option::of("[a-z]{1,8}"),
        prop::option::of(arb_password()),
        prop::option::of("[A-Za-z ]{1,10}"),
    )
        .prop_map(|(protocol, host, port, user, password, saved)| {
            let mut descriptor = SessionDescriptor::new(host.clone(), host, protocol);
            if let Some(port) = port {
                descriptor = descriptor.with_port(port);
            }
            if let Some(user) = user {
                let mut credentials = Credentials::user(user);
                if let Some(password) = password {
                    credentials = credentials.with_password(password);
                }
                descriptor = descriptor.with_credentials(credentials);
            }
            if let Some(saved) = saved {
                descriptor = descriptor.with_saved_config(saved);
            }
            descriptor
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn protocol_flag_follows_saved_config(descriptor in arb_descriptor()) {
        let command = build_command_line(Path::new("putty"), &descriptor);
        let offset = if descriptor.saved_config.is_some() { 2 } else { 0 };
        if let Some(ref saved) = descriptor.saved_config {
            prop_assert_eq!(&command.args[0], "-load");
            prop_assert_eq!(&command.args[1], saved);
        }
        let flag = match descriptor.protocol {
            Protocol::LocalShell => "-cygterm".to_string(),
            other => format!("-{}", other.as_str()),
        };
        prop_assert_eq!(&command.args[offset], &flag);
    }

    #[test]
    fn network_sessions_end_with_host(descriptor in arb_descriptor()) {
        prop_assume!(descriptor.protocol.is_network());
        let command = build_command_line(Path::new("putty"), &descriptor);
        prop_assert_eq!(command.args.last(), Some(&descriptor.host));
    }

    #[test]
    fn password_only_passed_for_ssh(descriptor in arb_descriptor()) {
        let command = build_command_line(Path::new("putty"), &descriptor);
        let has_pw = command.args.iter().any(|a| a == "-pw");
        let expects_pw = descriptor.protocol == Protocol::Ssh
            && descriptor.credentials.password.is_some();
        prop_assert_eq!(has_pw, expects_pw);
    }

    #[test]
    fn display_never_leaks_password(
        host in arb_host(),
        password in arb_password().prop_filter("not the mask", |p| p != "****"),
    ) {
        let descriptor = SessionDescriptor::new(host.clone(), host, Protocol::Ssh)
            .with_credentials(Credentials::user("root").with_password(password.clone()));
        let command = build_command_line(Path::new("putty"), &descriptor);
        let shown = command.to_string();
        prop_assert!(shown.contains("-pw ****"));
        prop_assert!(!command.redacted_args().contains(&password));
    }

    #[test]
    fn serial_speed_goes_into_sercfg(line in "/dev/tty[A-Z]{1,3}[0-9]", speed in 300u32..1_000_000) {
        let descriptor = SessionDescriptor::new("console", line.clone(), Protocol::Serial)
            .with_port(speed);
        let command = build_command_line(Path::new("putty"), &descriptor);
        prop_assert_eq!(
            command.args,
            vec![
                "-serial".to_string(),
                line,
                "-sercfg".to_string(),
                format!("{speed},8,n,1,N"),
            ]
        );
    }
}

// File: mode_tests.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

#[cfg(test)]
mod tests {
    use crate::mode::{FixedMode, HeaderModeController, ModeController, ProxyMode};
    use crate::request::ProxyRequest;
    use reqwest::header::{HeaderName, HeaderValue};
    use reqwest::Method;
    use rstest::*;

    #[rstest]
    #[case("default", ProxyMode::UseDefault)]
    #[case("alternative", ProxyMode::UseAlternative)]
    #[case("diff", ProxyMode::UseDefaultAndDiff)]
    #[case(" Shadow ", ProxyMode::UseDefaultAndDiff)]
    fn test_mode_from_str(#[case] input: &str, #[case] expected: ProxyMode) {
        assert_eq!(input.parse::<ProxyMode>().unwrap(), expected);
    }

    #[test]
    fn test_mode_from_str_rejects_unknown() {
        let err = "both".parse::<ProxyMode>().unwrap_err();
        assert!(err.to_string().contains("unknown proxy mode 'both'"));
    }

    #[test]
    fn test_mode_display_round_trips() {
        for mode in [
            ProxyMode::UseDefault,
            ProxyMode::UseAlternative,
            ProxyMode::UseDefaultAndDiff,
        ] {
            assert_eq!(mode.to_string().parse::<ProxyMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_fixed_mode() {
        let req = ProxyRequest::new(Method::GET, "/");
        assert_eq!(
            FixedMode(ProxyMode::UseAlternative).mode(&req),
            ProxyMode::UseAlternative
        );
    }

    #[test]
    fn test_closure_controller() {
        let controller = |req: &ProxyRequest| {
            if req.path().starts_with("/v2") {
                ProxyMode::UseAlternative
            } else {
                ProxyMode::UseDefaultAndDiff
            }
        };
        assert_eq!(
            controller.mode(&ProxyRequest::new(Method::GET, "/v2/items")),
            ProxyMode::UseAlternative
        );
        assert_eq!(
            controller.mode(&ProxyRequest::new(Method::GET, "/items")),
            ProxyMode::UseDefaultAndDiff
        );
    }

    #[test]
    fn test_header_controller() {
        let controller = HeaderModeController::new(ProxyMode::UseDefault);
        let plain = ProxyRequest::new(Method::GET, "/");
        let shadowed = ProxyRequest::new(Method::GET, "/").with_header(
            HeaderName::from_static("x-shadow-mode"),
            HeaderValue::from_static("diff"),
        );
        let garbage = ProxyRequest::new(Method::GET, "/").with_header(
            HeaderName::from_static("x-shadow-mode"),
            HeaderValue::from_static("sideways"),
        );

        assert_eq!(controller.mode(&plain), ProxyMode::UseDefault);
        assert_eq!(controller.mode(&shadowed), ProxyMode::UseDefaultAndDiff);
        assert_eq!(controller.mode(&garbage), ProxyMode::UseDefault);
    }

    #[test]
    fn test_header_controller_custom_header() {
        let controller = HeaderModeController::new(ProxyMode::UseDefault)
            .with_header(HeaderName::from_static("x-backend"));
        let req = ProxyRequest::new(Method::GET, "/").with_header(
            HeaderName::from_static("x-backend"),
            HeaderValue::from_static("alternative"),
        );
        assert_eq!(controller.header().as_str(), "x-backend");
        assert_eq!(controller.mode(&req), ProxyMode::UseAlternative);
    }
}

//! Property tests over the public resolution API.

use proptest::prelude::*;
use zenquery::{Config, OptionValue, Processor, Request};

fn process(config: Config, uri: &str) -> zenquery::Resolution {
    Processor::new(config).process(&Request::from_uri(uri), &())
}

fn expected_rotation(degrees: i32) -> Option<i64> {
    match degrees.rem_euclid(360) {
        d if d <= 45 || d > 315 => None,
        d if d <= 135 => Some(90),
        d if d <= 225 => Some(180),
        _ => Some(270),
    }
}

proptest! {
    #[test]
    fn rotation_folds_to_right_angles(deg in -1080i32..1080) {
        let r = process(Config::default(), &format!("/a.jpg?im.rotate={deg}"));
        let got = r.options.get("rotate").and_then(OptionValue::as_int);
        prop_assert_eq!(got, expected_rotation(deg));
        prop_assert!(r.diagnostics.warnings.is_empty());
    }

    #[test]
    fn blur_scales_and_clamps(amount in 0u32..1000) {
        let config = Config::default().with_advanced_features(true);
        let r = process(config, &format!("/a.jpg?im=Blur,{amount}"));
        let expected = (f64::from(amount) * 2.5).min(250.0);
        prop_assert_eq!(r.options.get("blur"), Some(&OptionValue::Float(expected)));
    }

    #[test]
    fn source_priority_ignores_order(
        path in 1u32..=100,
        vendor in 1u32..=100,
        standard in 1u32..=100,
        compact in 1u32..=100,
        order in Just(vec![0usize, 1, 2]).prop_shuffle(),
        with_path in any::<bool>(),
    ) {
        let pairs = [
            format!("im.quality={vendor}"),
            format!("quality={standard}"),
            format!("q={compact}"),
        ];
        let query: Vec<&str> = order.iter().map(|&i| pairs[i].as_str()).collect();
        let prefix = if with_path { format!("/_q={path}") } else { String::new() };
        let r = process(Config::default(), &format!("{prefix}/a.jpg?{}", query.join("&")));
        let expected = if with_path { path } else { vendor };
        prop_assert_eq!(
            r.options.get("quality").and_then(OptionValue::as_int),
            Some(i64::from(expected))
        );
    }

    #[test]
    fn canonical_query_is_a_fixed_point(
        width in 1u32..=12_000,
        height in proptest::option::of(1u32..=12_000),
        quality in proptest::option::of(1u32..=100),
        fit in proptest::sample::select(vec!["fit", "stretch", "fill", "crop", "pad"]),
        code in proptest::option::of(proptest::sample::select(vec!["xs", "s", "m", "xl"])),
    ) {
        let mut uri = format!("/a.jpg?im=Resize,width={width},mode={fit}");
        if let Some(h) = height {
            uri.push_str(&format!(",height={h}"));
        }
        if let Some(q) = quality {
            uri.push_str(&format!(";Quality,{q}"));
        }
        if let Some(c) = code {
            uri.push_str(&format!("&f={c}"));
        }
        let first = process(Config::default(), &uri);
        let again = process(Config::default(), &format!("/a.jpg?{}", first.options.to_query()));
        prop_assert_eq!(&again.options, &first.options);
        prop_assert_eq!(
            first.options.get("width").and_then(OptionValue::as_int),
            Some(i64::from(width))
        );
    }

    #[test]
    fn arbitrary_input_never_panics(path in "[a-z_=/()\\-.]{0,40}", query in "\\PC{0,80}") {
        let config = Config::default().with_advanced_features(true);
        let r = process(config, &format!("/{path}?{query}"));
        for (name, _) in r.options.iter() {
            prop_assert!(!matches!(name, "size" | "condition" | "overlay" | "imwidth" | "imheight"));
        }
    }
}

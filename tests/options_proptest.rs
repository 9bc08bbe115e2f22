// Property tests for option validation and plan determinism

use proptest::prelude::*;

use vidpress::engine::options::{
    CompressionOptions, Container, FrameRateTarget, Preset, ResolutionTarget,
};
use vidpress::engine::{CompressError, MediaProbe, build};

fn probe() -> MediaProbe {
    MediaProbe {
        width: 1920,
        height: 1080,
        duration_s: 42.0,
        has_video: true,
    }
}

fn arb_frame_rate() -> impl Strategy<Value = FrameRateTarget> {
    prop_oneof![
        Just(FrameRateTarget::Source),
        prop::sample::select(FrameRateTarget::ALLOWED.to_vec()).prop_map(FrameRateTarget::Fixed),
    ]
}

fn arb_valid_options() -> impl Strategy<Value = CompressionOptions> {
    (
        0u8..=51,
        prop::sample::select(Preset::ALL.to_vec()),
        0u32..=50_000,
        prop::sample::select(ResolutionTarget::ALL.to_vec()),
        arb_frame_rate(),
        prop::sample::select(Container::ALL.to_vec()),
    )
        .prop_map(
            |(quality, preset, bitrate_kbps, resolution, frame_rate, container)| {
                CompressionOptions {
                    quality,
                    preset,
                    bitrate_kbps,
                    resolution,
                    frame_rate,
                    container,
                }
            },
        )
}

proptest! {
    #[test]
    fn valid_options_always_build(options in arb_valid_options()) {
        prop_assert!(build(&options, &probe()).is_ok());
    }

    #[test]
    fn build_is_deterministic(options in arb_valid_options()) {
        let a = build(&options, &probe()).unwrap();
        let b = build(&options, &probe()).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn out_of_range_quality_always_rejected(
        quality in 52u8..,
        options in arb_valid_options(),
    ) {
        let options = CompressionOptions { quality, ..options };
        let err = build(&options, &probe()).unwrap_err();
        prop_assert!(matches!(err, CompressError::InvalidOptions(_)));
    }

    #[test]
    fn bitrate_flags_present_iff_target_set(options in arb_valid_options()) {
        let plan = build(&options, &probe()).unwrap();
        let has_rate_flags = plan.args.iter().any(|a| a == "-b:v");
        prop_assert_eq!(has_rate_flags, options.bitrate_kbps > 0);
    }

    #[test]
    fn quality_always_passed_through(options in arb_valid_options()) {
        let plan = build(&options, &probe()).unwrap();
        let crf_pos = plan.args.iter().position(|a| a == "-crf").unwrap();
        prop_assert_eq!(&plan.args[crf_pos + 1], &options.quality.to_string());
    }

    #[test]
    fn unknown_labels_never_parse(label in "[a-z0-9]{1,12}") {
        let known_preset = Preset::ALL.iter().any(|p| p.as_str() == label);
        prop_assert_eq!(label.parse::<Preset>().is_ok(), known_preset);

        let known_container = Container::ALL.iter().any(|c| c.extension() == label);
        prop_assert_eq!(label.parse::<Container>().is_ok(), known_container);
    }
}

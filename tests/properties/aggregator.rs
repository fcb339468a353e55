//! Property tests for the mipmap aggregator's ordering guarantees.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use proptest::prelude::*;

use simpack::{aggregate_mipmaps, MipLevel, MipmapGenerator, MipmapRequest};

/// Sleeps for the delay encoded in the request's quality field, scrambling
/// completion order relative to declaration order.
struct DelayedGenerator;

impl MipmapGenerator for DelayedGenerator {
    fn generate(&self, request: &MipmapRequest) -> Result<Vec<MipLevel>, String> {
        thread::sleep(Duration::from_millis(u64::from(request.quality)));
        Ok((0..=request.max_level)
            .map(|level| MipLevel {
                width: (request.width >> level).max(1),
                height: (request.height >> level).max(1),
                url: format!("data:image/png;base64,{}", request.name),
            })
            .collect())
    }
}

fn requests_strategy() -> impl Strategy<Value = Vec<MipmapRequest>> {
    let one = (
        proptest::string::string_regex("[a-z][a-z0-9-]{0,8}").unwrap(),
        1u32..2048,
        1u32..2048,
        0u32..4,
        0u32..8, // delay in ms, carried in the quality field
    );
    proptest::collection::vec(one, 0..6).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (name, width, height, max_level, delay))| MipmapRequest {
                // suffix keeps names unique regardless of generation
                name: format!("{name}-{i}"),
                source: PathBuf::from(format!("assets/{name}-{i}.png")),
                width,
                height,
                max_level,
                quality: delay,
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 24,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: manifest order equals declaration order, for every
    /// completion schedule.
    #[test]
    fn property_manifest_order_is_arrival_order_invariant(
        requests in requests_strategy()
    ) {
        let manifest = aggregate_mipmaps(&requests, &DelayedGenerator).unwrap();

        let declared: Vec<String> = requests.iter().map(|r| r.name.clone()).collect();
        let produced: Vec<String> = manifest.iter().map(|(n, _)| n.to_string()).collect();
        prop_assert_eq!(produced, declared);
    }

    /// PROPERTY: every asset carries exactly max_level + 1 levels, halving
    /// monotonically and never reaching zero.
    #[test]
    fn property_levels_halve_and_stay_positive(
        requests in requests_strategy()
    ) {
        let manifest = aggregate_mipmaps(&requests, &DelayedGenerator).unwrap();

        for request in &requests {
            let levels = manifest.get(&request.name).unwrap();
            prop_assert_eq!(levels.len(), request.max_level as usize + 1);
            for pair in levels.windows(2) {
                prop_assert!(pair[1].width <= pair[0].width);
                prop_assert!(pair[1].height <= pair[0].height);
            }
            for level in levels {
                prop_assert!(level.width >= 1);
                prop_assert!(level.height >= 1);
            }
        }
    }
}

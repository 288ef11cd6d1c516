//! Round-trip properties for the amount converter and registry codec.

use fortress_lib::amount::{from_sats, to_sats, AmountUnit};
use fortress_lib::registry::{decode_script, encode_script, RegistryRecord};
use proptest::prelude::*;

proptest! {
    #[test]
    fn bch_display_round_trips_every_amount(sats in any::<u64>()) {
        let text = from_sats(sats, AmountUnit::Bch);
        prop_assert_eq!(to_sats(&text, AmountUnit::Bch), sats);
    }

    #[test]
    fn bch_display_never_has_trailing_zero_artifacts(sats in any::<u64>()) {
        let text = from_sats(sats, AmountUnit::Bch);
        if let Some((_, fraction)) = text.split_once('.') {
            prop_assert!(!fraction.is_empty());
            prop_assert!(!fraction.ends_with('0'));
        }
    }

    #[test]
    fn sats_display_round_trips(sats in any::<u64>()) {
        let text = from_sats(sats, AmountUnit::Sats);
        prop_assert_eq!(to_sats(&text, AmountUnit::Sats), sats);
    }

    #[test]
    fn registry_record_round_trips(
        limit in 0u64..(1u64 << 32),
        hash in any::<[u8; 20]>(),
    ) {
        let script = encode_script(limit, &hash);
        let decoded = decode_script(&script).unwrap();
        prop_assert_eq!(decoded, RegistryRecord { limit, rescuer_pkh: hash });
    }

    #[test]
    fn registry_limit_encoding_is_minimal(limit in 1u64..(1u64 << 32)) {
        let script = encode_script(limit, &[0u8; 20]);
        let len = script[5] as usize;
        // Highest encoded byte is never zero for non-zero limits.
        prop_assert!(script[5 + len] != 0);
    }
}

use proptest::prelude::*;
use vpet_battle::{Attribute, BattleSimulator, Digimon, GlobalBattleSimulator, Protocol};
use vpet_replay::{Replay, decode_result, encode_result, receive_from_host};

fn digimon() -> impl Strategy<Value = Digimon> {
    (
        prop::sample::select(Attribute::ALL.to_vec()),
        0u32..256,
        1u32..30,
        0u8..=3,
        0u8..10,
    )
        .prop_map(|(attribute, power, hp, skill_score, level)| {
            let mut digimon = Digimon::new("Prop", attribute, power, hp);
            digimon.skill_score = skill_score;
            digimon.level = level;
            digimon
        })
}

proptest! {
    #[test]
    fn prop_duel_envelope_round_trips(
        a in digimon(),
        b in digimon(),
        protocol in prop::sample::select(Protocol::ALL.to_vec()),
        seed in any::<u64>(),
    ) {
        let result = BattleSimulator::new().simulate_seeded(&a, &b, protocol, seed).unwrap();
        let envelope = encode_result(&result).unwrap();

        prop_assert_eq!(decode_result(&envelope).unwrap(), result.clone());
        prop_assert_eq!(receive_from_host(&envelope).unwrap().mirrored(), result);
    }

    #[test]
    fn prop_team_envelope_round_trips(
        team1 in prop::collection::vec(digimon(), 1..4),
        team2 in prop::collection::vec(digimon(), 1..4),
        seed in any::<u64>(),
    ) {
        let result = GlobalBattleSimulator::default()
            .simulate_seeded(&team1, &team2, seed)
            .unwrap();
        let decoded = decode_result(&encode_result(&result).unwrap()).unwrap();

        prop_assert_eq!(Replay::new(&decoded).count(), result.turns());
        prop_assert_eq!(decoded, result);
    }
}

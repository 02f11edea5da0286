//! Property tests for the binary codec, bit-string arithmetic, memory and
//! the MOV/OUT data path.

use proptest::prelude::*;
use zev::binary::{add_binary, decode_signed, decode_unsigned, encode_unsigned, sub_binary};
use zev::{assemble, Address, CaptureSerial, Cpu, MachineConfig, Memory, Word};

/// Bit-strings of 1..=32 digits, possibly with leading zeros.
fn bit_string() -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![Just('0'), Just('1')], 1..=32)
        .prop_map(|digits| digits.into_iter().collect())
}

proptest! {
    #[test]
    fn encode_then_decode_is_identity(value in any::<u64>(), width in 1usize..=64) {
        let bits = encode_unsigned(value, width);
        prop_assert!(bits.width() >= width);
        prop_assert_eq!(decode_unsigned(bits.as_str()).unwrap(), value);
    }

    #[test]
    fn add_matches_native(a in bit_string(), b in bit_string()) {
        let expected = decode_unsigned(&a).unwrap() + decode_unsigned(&b).unwrap();
        let sum = add_binary(&a, &b).unwrap();
        prop_assert_eq!(decode_unsigned(sum.as_str()).unwrap(), expected);
        prop_assert!(sum.as_str() == "0" || !sum.as_str().starts_with('0'));
    }

    #[test]
    fn sub_matches_native(a in bit_string(), b in bit_string()) {
        let expected = decode_unsigned(&a).unwrap() as i64 - decode_unsigned(&b).unwrap() as i64;
        let diff = sub_binary(&a, &b).unwrap();
        prop_assert_eq!(decode_signed(diff.as_str()).unwrap(), expected);
        prop_assert_eq!(diff.is_negative(), expected < 0);
    }

    #[test]
    fn add_is_commutative(a in bit_string(), b in bit_string()) {
        prop_assert_eq!(add_binary(&a, &b).unwrap(), add_binary(&b, &a).unwrap());
    }

    #[test]
    fn insert_then_get(values in proptest::collection::vec(any::<u32>(), 1..20)) {
        let mut mem = Memory::new();
        let mut placed = Vec::new();
        for v in &values {
            let word = Word::new(vec![encode_unsigned(*v as u64, 4)]);
            let addr = mem.insert(word.clone()).unwrap();
            placed.push((addr, word));
        }

        for (i, (addr, word)) in placed.iter().enumerate() {
            prop_assert_eq!(*addr, Address(i as u64 + 1));
            prop_assert_eq!(mem.get(*addr).unwrap(), word);
        }
    }

    #[test]
    fn mov_then_out_emits_the_immediate(value in 0u64..=i64::MAX as u64, reg in 0u64..8) {
        let source = format!("MOV reg{reg} ${value}\nOUT reg{reg}\nEXIT $0");
        let program = assemble(&source).unwrap();

        let mut cpu = Cpu::with_serial(MachineConfig::default(), CaptureSerial::new());
        cpu.load_program(&program).unwrap();
        let status = cpu.run().unwrap();

        prop_assert_eq!(status.code, 0);
        prop_assert_eq!(cpu.serial().values(), &[Some(value as i64)]);
    }
}

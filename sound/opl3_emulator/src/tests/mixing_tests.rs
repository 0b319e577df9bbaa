use super::*;

fn right(samples: &[i16]) -> Vec<i16> {
    samples.iter().skip(1).step_by(2).copied().collect()
}

#[test]
fn test_new_mode_output_enables() {
    let mut chip = Chip::new(false);
    chip.write_reg(0x105, 0x01);
    program_voice(&mut chip, 2, 0x20, 5);
    key_on(&mut chip, 2, 0x200, 4);
    let out = render(&mut chip, 400);
    assert!(left(&out).iter().all(|s| *s == 0));
    assert!(right(&out).iter().any(|s| *s != 0));

    chip.write_reg(channel_reg(2, 0xc0), 0x00);
    render(&mut chip, 1);
    assert!(render(&mut chip, 400).iter().all(|s| *s == 0));
}

#[test]
fn test_legacy_mode_ignores_enables() {
    let mut chip = Chip::new(false);
    program_voice(&mut chip, 2, 0x00, 5);
    key_on(&mut chip, 2, 0x200, 4);
    let out = render(&mut chip, 400);
    assert!(left(&out).iter().any(|s| *s != 0));
    assert!(right(&out).iter().any(|s| *s != 0));
}

#[test]
fn test_four_op_routes_through_secondary() {
    let mut chip = Chip::new(false);
    chip.write_reg(0x105, 0x01);
    chip.write_reg(0x104, 0x01);
    program_voice(&mut chip, 0, 0x30, 5);
    program_voice(&mut chip, 3, 0x31, 5);
    key_on(&mut chip, 0, 0x200, 4);
    for op in [0, 3, 6, 9] {
        assert!(chip.operator(op).is_some_and(|o| o.is_keyed()), "operator {}", op);
    }
    assert!(render(&mut chip, 400).iter().any(|s| *s != 0));

    // the pair's output enables live on the secondary channel
    chip.write_reg(channel_reg(3, 0xc0), 0x01);
    render(&mut chip, 1);
    assert!(render(&mut chip, 400).iter().all(|s| *s == 0));
}

#[test]
fn test_mix_saturates() {
    let mut chip = Chip::new(false);
    for ch in 0..18 {
        program_voice(&mut chip, ch, 0x01, 5);
        chip.write_reg(operator_reg(ch) + 0x40, 0x00);
    }
    for ch in 0..18 {
        key_on(&mut chip, ch, 0x200, 4);
    }
    let out = render(&mut chip, 256);
    assert_eq!(left(&out).iter().copied().max(), Some(i16::MAX));
    assert_eq!(left(&out).iter().copied().min(), Some(i16::MIN));
}

#[test]
fn test_resampled_output_tracks_native() {
    let mut native = Chip::new(false);
    let mut host = Chip::new(false);
    host.set_output_rate(24858).expect("valid rate");
    for chip in [&mut native, &mut host] {
        program_voice(chip, 0, 0x01, 5);
        key_on(chip, 0, 0x100, 3);
    }
    let a = left(&render(&mut native, 4096));
    let mut out = vec![0i16; 2048 * 2];
    host.generate_resampled(&mut out);
    let b = left(&out);

    // half the native rate: every output lands on a native sample
    assert_eq!(host.sample_counter(), 4094);
    assert_eq!(b[0], 0);
    for n in 1..b.len() {
        assert_eq!(b[n], a[2 * n - 2], "output {}", n);
    }
}

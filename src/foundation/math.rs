pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Straight-alpha `src` over `dst`, with `coverage` scaling the source alpha.
pub(crate) fn over_straight(dst: [u8; 4], src: [u8; 4], coverage: u8) -> [u8; 4] {
    let sa = mul_div255_u16(u16::from(src[3]), u16::from(coverage));
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return [src[0], src[1], src[2], 255];
    }

    let inv = 255 - sa;
    let da = mul_div255_u16(u16::from(dst[3]), inv);
    let out_a = sa + da;
    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = u32::from(src[i]) * u32::from(sa) + u32::from(dst[i]) * u32::from(da);
        out[i] = ((c + u32::from(out_a) / 2) / u32::from(out_a)).min(255) as u8;
    }
    out[3] = out_a.min(255) as u8;
    out
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;

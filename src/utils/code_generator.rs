use rand::Rng;

const CODE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 8;

/// 生成推荐券码，格式 PREFIX-XXXXXXXX（去掉易混淆的 0/O/1/I）
pub fn generate_coupon_code(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let body: String = (0..CODE_LEN)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect();
    let prefix = normalize_code(prefix);
    if prefix.is_empty() {
        body
    } else {
        format!("{prefix}-{body}")
    }
}

/// 优惠码统一存储为去空格的大写形式
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

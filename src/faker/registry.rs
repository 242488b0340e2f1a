use crate::faker::locale::{LocaleData, find_locale};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// 生成器的输出
#[derive(Debug, Clone, PartialEq)]
pub enum FakeValue {
    Text(String),
    /// date 模块的结果，统一渲染为 `YYYY-MM-DDTHH:MM:SS.sssZ`
    Date(DateTime<Utc>),
}

impl FakeValue {
    pub fn render(&self) -> String {
        match self {
            FakeValue::Text(text) => text.clone(),
            FakeValue::Date(date) => date.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// 单次生成调用的上下文（语言区域 + 随机源）
pub struct FakeContext {
    pub locale: &'static LocaleData,
    rng: StdRng,
    now: DateTime<Utc>,
}

impl FakeContext {
    pub fn new(locale: &str) -> Self {
        Self {
            locale: find_locale(locale),
            rng: StdRng::from_rng(&mut rand::rng()),
            now: Utc::now(),
        }
    }

    /// 固定种子和时间，测试用
    pub fn seeded(locale: &str, seed: u64, now: DateTime<Utc>) -> Self {
        Self {
            locale: find_locale(locale),
            rng: StdRng::seed_from_u64(seed),
            now,
        }
    }

    fn pick(&mut self, items: &'static [&'static str]) -> &'static str {
        items.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn range(&mut self, low: i64, high: i64) -> i64 {
        if low >= high {
            return low;
        }
        self.rng.random_range(low..=high)
    }

    /// 将模式中的每个 `#` 替换为随机数字
    fn digits(&mut self, pattern: &str) -> String {
        pattern
            .chars()
            .map(|c| {
                if c == '#' {
                    char::from(b'0' + self.rng.random_range(0..10u8))
                } else {
                    c
                }
            })
            .collect()
    }

    fn offset(&mut self, min_seconds: i64, max_seconds: i64) -> Duration {
        Duration::seconds(self.range(min_seconds, max_seconds))
    }
}

pub type GeneratorFn = fn(&mut FakeContext, &[Value]) -> FakeValue;

/// 注册表中的一个生成器
#[derive(Clone)]
pub struct GeneratorSpec {
    pub module: &'static str,
    pub function: &'static str,
    func: GeneratorFn,
}

impl GeneratorSpec {
    pub fn name(&self) -> String {
        format!("{}.{}", self.module, self.function)
    }

    pub fn call(&self, ctx: &mut FakeContext, args: &[Value]) -> FakeValue {
        (self.func)(ctx, args)
    }
}

impl std::fmt::Debug for GeneratorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GeneratorSpec({})", self.name())
    }
}

/// 生成器注册表，进程启动时构建一次
pub struct GeneratorRegistry {
    specs: Vec<GeneratorSpec>,
    index: HashMap<String, usize>,
}

const DAY: i64 = 24 * 60 * 60;
const YEAR: i64 = 365 * DAY;

fn text(value: impl Into<String>) -> FakeValue {
    FakeValue::Text(value.into())
}

/// 去掉变音符号，生成邮箱/用户名用
fn slug(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.to_lowercase().chars() {
        match c {
            'ä' => out.push_str("ae"),
            'ö' => out.push_str("oe"),
            'ü' => out.push_str("ue"),
            'ß' => out.push_str("ss"),
            'é' | 'è' | 'ê' => out.push('e'),
            'à' | 'â' => out.push('a'),
            'ç' => out.push('c'),
            'î' | 'ï' => out.push('i'),
            'ô' => out.push('o'),
            c if c.is_ascii_alphanumeric() => out.push(c),
            _ => {}
        }
    }
    out
}

fn first_name(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.pick(ctx.locale.first_names))
}

fn last_name(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.pick(ctx.locale.last_names))
}

fn full_name(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    let first = ctx.pick(ctx.locale.first_names);
    let last = ctx.pick(ctx.locale.last_names);
    text(format!("{} {}", first, last))
}

fn prefix(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.pick(ctx.locale.prefixes))
}

fn job_title(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.pick(ctx.locale.job_titles))
}

fn sex(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.pick(&["female", "male"]))
}

fn user_name(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    let first = slug(ctx.pick(ctx.locale.first_names));
    let last = slug(ctx.pick(ctx.locale.last_names));
    let n = ctx.range(1, 99);
    text(format!("{}.{}{}", first, last, n))
}

fn domain_name(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    let company = slug(ctx.pick(ctx.locale.last_names));
    let suffix = ctx.pick(ctx.locale.domain_suffixes);
    text(format!("{}.{}", company, suffix))
}

fn email(ctx: &mut FakeContext, args: &[Value]) -> FakeValue {
    let user = user_name(ctx, args).render();
    let domain = domain_name(ctx, args).render();
    text(format!("{}@{}", user, domain))
}

fn url(ctx: &mut FakeContext, args: &[Value]) -> FakeValue {
    text(format!("https://www.{}", domain_name(ctx, args).render()))
}

fn ipv4(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    let parts: Vec<String> = (0..4).map(|_| ctx.range(1, 254).to_string()).collect();
    text(parts.join("."))
}

fn password(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    const CHARSET: &[u8] = b"abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ23456789!$%";
    let value: String = (0..15)
        .map(|_| char::from(CHARSET[ctx.rng.random_range(0..CHARSET.len())]))
        .collect();
    text(value)
}

fn city(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.pick(ctx.locale.cities))
}

fn street(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.pick(ctx.locale.streets))
}

fn building_number(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.range(1, 199).to_string())
}

fn street_address(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    let street = ctx.pick(ctx.locale.streets);
    let number = ctx.range(1, 199);
    text(format!("{} {}", street, number))
}

fn zip_code(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.digits(ctx.locale.zip_format))
}

fn country(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.locale.country)
}

fn country_code(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.locale.country_code)
}

/// phone.number，可选一个掩码参数（`#` 为数字占位）
fn phone_number(ctx: &mut FakeContext, args: &[Value]) -> FakeValue {
    let format = match args.first().and_then(Value::as_str) {
        Some(mask) => mask.to_string(),
        None => ctx.pick(ctx.locale.phone_formats).to_string(),
    };
    text(ctx.digits(&format))
}

fn company_name(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    let name = ctx.pick(ctx.locale.last_names);
    let suffix = ctx.pick(ctx.locale.company_suffixes);
    text(format!("{} {}", name, suffix))
}

fn word(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.pick(ctx.locale.words))
}

fn words(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    let words: Vec<&str> = (0..3).map(|_| ctx.pick(ctx.locale.words)).collect();
    text(words.join(" "))
}

fn sentence(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    let count = ctx.range(4, 9);
    let words: Vec<&str> = (0..count).map(|_| ctx.pick(ctx.locale.words)).collect();
    let mut sentence = capitalize(&words.join(" "));
    sentence.push('.');
    text(sentence)
}

/// 首字母大写，按字符处理（"élan" -> "Élan"）
fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn uuid(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    let bytes: [u8; 16] = ctx.rng.random();
    text(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
}

fn alpha(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    let value: String = (0..10)
        .map(|_| char::from(b'a' + ctx.rng.random_range(0..26u8)))
        .collect();
    text(value)
}

fn numeric(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.digits("##########"))
}

fn alphanumeric(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let value: String = (0..10)
        .map(|_| char::from(CHARSET[ctx.rng.random_range(0..CHARSET.len())]))
        .collect();
    text(value)
}

fn int(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.range(0, 99_999).to_string())
}

fn float(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    let cents = ctx.range(0, 9_999_999);
    text(format!("{:.2}", cents as f64 / 100.0))
}

fn boolean(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.rng.random_bool(0.5).to_string())
}

fn date_past(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    FakeValue::Date(ctx.now - ctx.offset(DAY, YEAR))
}

fn date_future(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    FakeValue::Date(ctx.now + ctx.offset(DAY, YEAR))
}

fn date_recent(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    FakeValue::Date(ctx.now - ctx.offset(1, DAY))
}

fn date_soon(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    FakeValue::Date(ctx.now + ctx.offset(1, DAY))
}

fn date_birthdate(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    FakeValue::Date(ctx.now - ctx.offset(18 * YEAR, 80 * YEAR))
}

fn date_anytime(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    FakeValue::Date(ctx.now + ctx.offset(-YEAR, YEAR))
}

fn product_name(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.pick(ctx.locale.products))
}

fn price(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    let cents = ctx.range(100, 100_000);
    text(format!("{:.2}", cents as f64 / 100.0))
}

fn currency_code(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.locale.currency_code)
}

fn account_number(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    text(ctx.digits("########"))
}

/// 带正确校验位的 IBAN（国家代码取自语言区域）
fn iban(ctx: &mut FakeContext, _: &[Value]) -> FakeValue {
    let country = ctx.locale.country_code;
    let bban = ctx.digits("##################");

    // 校验位：BBAN + 国家字母数值 + "00" 对 97 取模
    let mut rearranged = bban.clone();
    for c in country.chars() {
        rearranged.push_str(&(c as u32 - 'A' as u32 + 10).to_string());
    }
    rearranged.push_str("00");
    let remainder = rearranged
        .chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0u32, |acc, d| (acc * 10 + d) % 97);

    text(format!("{}{:02}{}", country, 98 - remainder, bban))
}

const GENERATORS: &[(&str, &str, GeneratorFn)] = &[
    ("person", "firstName", first_name),
    ("person", "lastName", last_name),
    ("person", "fullName", full_name),
    ("person", "prefix", prefix),
    ("person", "jobTitle", job_title),
    ("person", "sex", sex),
    ("internet", "email", email),
    ("internet", "userName", user_name),
    ("internet", "url", url),
    ("internet", "domainName", domain_name),
    ("internet", "ipv4", ipv4),
    ("internet", "password", password),
    ("location", "city", city),
    ("location", "street", street),
    ("location", "streetAddress", street_address),
    ("location", "buildingNumber", building_number),
    ("location", "zipCode", zip_code),
    ("location", "country", country),
    ("location", "countryCode", country_code),
    ("phone", "number", phone_number),
    ("company", "name", company_name),
    ("lorem", "word", word),
    ("lorem", "words", words),
    ("lorem", "sentence", sentence),
    ("string", "uuid", uuid),
    ("string", "alpha", alpha),
    ("string", "numeric", numeric),
    ("string", "alphanumeric", alphanumeric),
    ("number", "int", int),
    ("number", "float", float),
    ("datatype", "boolean", boolean),
    ("date", "past", date_past),
    ("date", "future", date_future),
    ("date", "recent", date_recent),
    ("date", "soon", date_soon),
    ("date", "birthdate", date_birthdate),
    ("date", "anytime", date_anytime),
    ("commerce", "productName", product_name),
    ("commerce", "price", price),
    ("finance", "iban", iban),
    ("finance", "accountNumber", account_number),
    ("finance", "currencyCode", currency_code),
];

impl GeneratorRegistry {
    pub fn new() -> Self {
        let specs: Vec<GeneratorSpec> = GENERATORS
            .iter()
            .map(|&(module, function, func)| GeneratorSpec {
                module,
                function,
                func,
            })
            .collect();
        let index = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| (spec.name(), i))
            .collect();

        Self { specs, index }
    }

    /// 进程级共享实例
    pub fn global() -> &'static GeneratorRegistry {
        static REGISTRY: OnceLock<GeneratorRegistry> = OnceLock::new();
        REGISTRY.get_or_init(GeneratorRegistry::new)
    }

    pub fn get(&self, module: &str, function: &str) -> Option<&GeneratorSpec> {
        self.index
            .get(&format!("{}.{}", module, function))
            .map(|&i| &self.specs[i])
    }

    pub fn specs(&self) -> &[GeneratorSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// 生成器目录：`$$module.fn` -> `$$faker.module.fn()$$`
    pub fn catalogue(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.specs.iter().map(|spec| {
            (
                format!("$${}.{}", spec.module, spec.function),
                format!("$$faker.{}.{}()$$", spec.module, spec.function),
            )
        })
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Faker 模块 - 按语言区域生成假数据
pub mod locale;
pub mod registry;

pub use locale::{LocaleData, find_locale, locale_codes};
pub use registry::{FakeContext, FakeValue, GeneratorRegistry, GeneratorSpec};

/// 各语言区域的生成数据
#[derive(Debug)]
pub struct LocaleData {
    pub code: &'static str,
    pub country: &'static str,
    pub country_code: &'static str,
    pub currency_code: &'static str,
    pub first_names: &'static [&'static str],
    pub last_names: &'static [&'static str],
    pub prefixes: &'static [&'static str],
    pub job_titles: &'static [&'static str],
    pub cities: &'static [&'static str],
    pub streets: &'static [&'static str],
    /// `#` 为占位数字
    pub zip_format: &'static str,
    pub phone_formats: &'static [&'static str],
    pub company_suffixes: &'static [&'static str],
    pub domain_suffixes: &'static [&'static str],
    pub products: &'static [&'static str],
    pub words: &'static [&'static str],
}

pub const DEFAULT_FALLBACK: &str = "en";

const LOREM: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "labore", "dolore", "magna", "aliqua", "enim", "minim",
    "veniam", "quis", "nostrud",
];

pub static LOCALES: &[LocaleData] = &[
    LocaleData {
        code: "de",
        country: "Deutschland",
        country_code: "DE",
        currency_code: "EUR",
        first_names: &[
            "Anna", "Lukas", "Marie", "Jonas", "Sophie", "Felix", "Lea", "Paul", "Jürgen", "Hannah",
            "Maximilian",
        ],
        last_names: &[
            "Müller", "Schmidt", "Schneider", "Fischer", "Weber", "Meyer", "Wagner", "Becker",
            "Schulz", "Hoffmann",
        ],
        prefixes: &["Herr", "Frau", "Dr."],
        job_titles: &["Softwareentwickler", "Projektleiterin", "Vertriebsmitarbeiter", "Buchhalterin"],
        cities: &["Berlin", "Hamburg", "München", "Köln", "Frankfurt am Main", "Stuttgart", "Leipzig"],
        streets: &["Hauptstraße", "Schulstraße", "Gartenweg", "Bahnhofstraße", "Lindenallee"],
        zip_format: "#####",
        phone_formats: &["+49 ### #######", "0### ########", "+49 1## #######"],
        company_suffixes: &["GmbH", "AG", "KG", "GmbH & Co. KG"],
        domain_suffixes: &["de", "com", "net"],
        products: &["Kaffeemaschine", "Fahrrad", "Schreibtisch", "Wanderschuhe", "Rucksack"],
        words: LOREM,
    },
    LocaleData {
        code: "en",
        country: "United States",
        country_code: "US",
        currency_code: "USD",
        first_names: &[
            "James", "Mary", "John", "Patricia", "Robert", "Jennifer", "Michael", "Linda",
            "William", "Elizabeth",
        ],
        last_names: &[
            "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
            "Wilson", "Taylor",
        ],
        prefixes: &["Mr.", "Mrs.", "Ms.", "Dr."],
        job_titles: &["Software Engineer", "Product Manager", "Sales Associate", "Accountant"],
        cities: &["New York", "Chicago", "Houston", "Phoenix", "Seattle", "Denver", "Boston"],
        streets: &["Main Street", "Oak Avenue", "Maple Drive", "Cedar Lane", "Park Road"],
        zip_format: "#####",
        phone_formats: &["+1 ###-###-####", "(###) ###-####", "###.###.####"],
        company_suffixes: &["Inc", "LLC", "Group", "and Sons"],
        domain_suffixes: &["com", "net", "org", "io"],
        products: &["Coffee Maker", "Bicycle", "Desk", "Hiking Boots", "Backpack"],
        words: LOREM,
    },
    LocaleData {
        code: "fr",
        country: "France",
        country_code: "FR",
        currency_code: "EUR",
        first_names: &[
            "Camille", "Louis", "Chloé", "Hugo", "Léa", "Gabriel", "Manon", "Arthur", "Inès",
            "Jules",
        ],
        last_names: &[
            "Martin", "Bernard", "Dubois", "Thomas", "Robert", "Richard", "Petit", "Durand",
            "Leroy", "Moreau",
        ],
        prefixes: &["M.", "Mme", "Dr"],
        job_titles: &["Développeur", "Chef de projet", "Commercial", "Comptable"],
        cities: &["Paris", "Lyon", "Marseille", "Toulouse", "Nantes", "Bordeaux", "Lille"],
        streets: &["Rue de la Paix", "Avenue Victor Hugo", "Rue du Moulin", "Boulevard Voltaire"],
        zip_format: "#####",
        phone_formats: &["+33 # ## ## ## ##", "0# ## ## ## ##"],
        company_suffixes: &["SARL", "SA", "SAS", "EURL"],
        domain_suffixes: &["fr", "com", "net"],
        products: &["Cafetière", "Vélo", "Bureau", "Chaussures de randonnée", "Sac à dos"],
        words: LOREM,
    },
];

/// 按代码查找语言区域；未知代码回退到英语
pub fn find_locale(code: &str) -> &'static LocaleData {
    LOCALES
        .iter()
        .find(|locale| locale.code.eq_ignore_ascii_case(code))
        .or_else(|| LOCALES.iter().find(|locale| locale.code == DEFAULT_FALLBACK))
        .unwrap_or(&LOCALES[0])
}

/// 所有支持的语言区域代码
pub fn locale_codes() -> impl Iterator<Item = &'static str> {
    LOCALES.iter().map(|locale| locale.code)
}

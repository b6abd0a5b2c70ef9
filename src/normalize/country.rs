//! Country name to ISO 3166-1 alpha-2 resolution over an embedded table

/// One ISO 3166-1 entry. `aliases` holds official and common names as
/// reported by geolocation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    pub alpha2: &'static str,
    pub alpha3: &'static str,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

impl Country {
    fn names(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }
}

/// Resolve a country name to its alpha-2 code: exact match on any known name
/// (or on the alpha-2/alpha-3 code itself) first, fuzzy match on a miss.
pub fn lookup_code(name: &str) -> Option<&'static str> {
    find_exact(name)
        .or_else(|| find_fuzzy(name))
        .map(|country| country.alpha2)
}

/// Reverse lookup: the ISO short name for an alpha-2 code.
pub fn name_for_code(code: &str) -> Option<&'static str> {
    let code = code.trim();
    COUNTRIES
        .iter()
        .find(|c| c.alpha2.eq_ignore_ascii_case(code))
        .map(|c| c.name)
}

pub fn find_exact(name: &str) -> Option<&'static Country> {
    let query = normalize_name(name);
    if query.is_empty() {
        return None;
    }

    if query.len() <= 3 {
        if let Some(country) = COUNTRIES
            .iter()
            .find(|c| c.alpha2.eq_ignore_ascii_case(&query) || c.alpha3.eq_ignore_ascii_case(&query))
        {
            return Some(country);
        }
    }

    COUNTRIES
        .iter()
        .find(|c| c.names().any(|n| normalize_name(n) == query))
}

/// Fuzzy match. A known name containing the query wins (names starting with
/// it first); failing that, the longest known name contained in the query as
/// whole words.
pub fn find_fuzzy(name: &str) -> Option<&'static Country> {
    let query = normalize_name(name);
    if query.len() < 3 {
        return None;
    }

    let mut best: Option<(u8, &'static Country)> = None;
    for country in COUNTRIES {
        for candidate in country.names() {
            let candidate = normalize_name(candidate);
            let score = if candidate.starts_with(&query) {
                2
            } else if candidate.contains(&query) {
                1
            } else {
                continue;
            };
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, country));
            }
        }
    }
    if let Some((_, country)) = best {
        return Some(country);
    }

    let padded_query = format!(" {query} ");
    COUNTRIES
        .iter()
        .flat_map(|country| country.names().map(move |n| (normalize_name(n), country)))
        .filter(|(candidate, _)| candidate.len() >= 4 && padded_query.contains(&format!(" {candidate} ")))
        .max_by(|(a, _), (b, _)| a.len().cmp(&b.len()))
        .map(|(_, country)| country)
}

/// Lowercase, strip punctuation and collapse whitespace.
fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

macro_rules! country {
    ($a2:literal, $a3:literal, $name:literal) => {
        Country { alpha2: $a2, alpha3: $a3, name: $name, aliases: &[] }
    };
    ($a2:literal, $a3:literal, $name:literal, [$($alias:literal),+ $(,)?]) => {
        Country { alpha2: $a2, alpha3: $a3, name: $name, aliases: &[$($alias),+] }
    };
}

pub static COUNTRIES: &[Country] = &[
    country!("AD", "AND", "Andorra"),
    country!("AE", "ARE", "United Arab Emirates", ["UAE"]),
    country!("AF", "AFG", "Afghanistan", ["Islamic Republic of Afghanistan"]),
    country!("AG", "ATG", "Antigua and Barbuda"),
    country!("AI", "AIA", "Anguilla"),
    country!("AL", "ALB", "Albania", ["Republic of Albania"]),
    country!("AM", "ARM", "Armenia", ["Republic of Armenia"]),
    country!("AO", "AGO", "Angola", ["Republic of Angola"]),
    country!("AQ", "ATA", "Antarctica"),
    country!("AR", "ARG", "Argentina", ["Argentine Republic"]),
    country!("AS", "ASM", "American Samoa"),
    country!("AT", "AUT", "Austria", ["Republic of Austria"]),
    country!("AU", "AUS", "Australia"),
    country!("AW", "ABW", "Aruba"),
    country!("AX", "ALA", "Åland Islands", ["Aland Islands", "Aland"]),
    country!("AZ", "AZE", "Azerbaijan", ["Republic of Azerbaijan"]),
    country!("BA", "BIH", "Bosnia and Herzegovina", ["Bosnia"]),
    country!("BB", "BRB", "Barbados"),
    country!("BD", "BGD", "Bangladesh", ["People's Republic of Bangladesh"]),
    country!("BE", "BEL", "Belgium", ["Kingdom of Belgium"]),
    country!("BF", "BFA", "Burkina Faso"),
    country!("BG", "BGR", "Bulgaria", ["Republic of Bulgaria"]),
    country!("BH", "BHR", "Bahrain", ["Kingdom of Bahrain"]),
    country!("BI", "BDI", "Burundi", ["Republic of Burundi"]),
    country!("BJ", "BEN", "Benin", ["Republic of Benin"]),
    country!("BL", "BLM", "Saint Barthélemy", ["Saint Barthelemy"]),
    country!("BM", "BMU", "Bermuda"),
    country!("BN", "BRN", "Brunei Darussalam", ["Brunei"]),
    country!("BO", "BOL", "Bolivia, Plurinational State of", ["Bolivia", "Plurinational State of Bolivia"]),
    country!("BQ", "BES", "Bonaire, Sint Eustatius and Saba", ["Bonaire", "Caribbean Netherlands"]),
    country!("BR", "BRA", "Brazil", ["Federative Republic of Brazil"]),
    country!("BS", "BHS", "Bahamas", ["Commonwealth of the Bahamas", "The Bahamas"]),
    country!("BT", "BTN", "Bhutan", ["Kingdom of Bhutan"]),
    country!("BV", "BVT", "Bouvet Island"),
    country!("BW", "BWA", "Botswana", ["Republic of Botswana"]),
    country!("BY", "BLR", "Belarus", ["Republic of Belarus"]),
    country!("BZ", "BLZ", "Belize"),
    country!("CA", "CAN", "Canada"),
    country!("CC", "CCK", "Cocos (Keeling) Islands", ["Cocos Islands"]),
    country!("CD", "COD", "Congo, The Democratic Republic of the", ["Democratic Republic of the Congo", "DR Congo", "DRC", "Congo-Kinshasa"]),
    country!("CF", "CAF", "Central African Republic"),
    country!("CG", "COG", "Congo", ["Republic of the Congo", "Congo Republic", "Congo-Brazzaville"]),
    country!("CH", "CHE", "Switzerland", ["Swiss Confederation"]),
    country!("CI", "CIV", "Côte d'Ivoire", ["Cote d'Ivoire", "Ivory Coast", "Republic of Côte d'Ivoire"]),
    country!("CK", "COK", "Cook Islands"),
    country!("CL", "CHL", "Chile", ["Republic of Chile"]),
    country!("CM", "CMR", "Cameroon", ["Republic of Cameroon"]),
    country!("CN", "CHN", "China", ["People's Republic of China", "Mainland China"]),
    country!("CO", "COL", "Colombia", ["Republic of Colombia"]),
    country!("CR", "CRI", "Costa Rica", ["Republic of Costa Rica"]),
    country!("CU", "CUB", "Cuba", ["Republic of Cuba"]),
    country!("CV", "CPV", "Cabo Verde", ["Cape Verde", "Republic of Cabo Verde"]),
    country!("CW", "CUW", "Curaçao", ["Curacao"]),
    country!("CX", "CXR", "Christmas Island"),
    country!("CY", "CYP", "Cyprus", ["Republic of Cyprus"]),
    country!("CZ", "CZE", "Czechia", ["Czech Republic"]),
    country!("DE", "DEU", "Germany", ["Federal Republic of Germany"]),
    country!("DJ", "DJI", "Djibouti", ["Republic of Djibouti"]),
    country!("DK", "DNK", "Denmark", ["Kingdom of Denmark"]),
    country!("DM", "DMA", "Dominica", ["Commonwealth of Dominica"]),
    country!("DO", "DOM", "Dominican Republic"),
    country!("DZ", "DZA", "Algeria", ["People's Democratic Republic of Algeria"]),
    country!("EC", "ECU", "Ecuador", ["Republic of Ecuador"]),
    country!("EE", "EST", "Estonia", ["Republic of Estonia"]),
    country!("EG", "EGY", "Egypt", ["Arab Republic of Egypt"]),
    country!("EH", "ESH", "Western Sahara"),
    country!("ER", "ERI", "Eritrea", ["the State of Eritrea"]),
    country!("ES", "ESP", "Spain", ["Kingdom of Spain"]),
    country!("ET", "ETH", "Ethiopia", ["Federal Democratic Republic of Ethiopia"]),
    country!("FI", "FIN", "Finland", ["Republic of Finland"]),
    country!("FJ", "FJI", "Fiji", ["Republic of Fiji"]),
    country!("FK", "FLK", "Falkland Islands (Malvinas)", ["Falkland Islands"]),
    country!("FM", "FSM", "Micronesia, Federated States of", ["Micronesia", "Federated States of Micronesia"]),
    country!("FO", "FRO", "Faroe Islands"),
    country!("FR", "FRA", "France", ["French Republic"]),
    country!("GA", "GAB", "Gabon", ["Gabonese Republic"]),
    country!("GB", "GBR", "United Kingdom", ["United Kingdom of Great Britain and Northern Ireland", "Great Britain", "UK", "England", "Scotland", "Wales"]),
    country!("GD", "GRD", "Grenada"),
    country!("GE", "GEO", "Georgia"),
    country!("GF", "GUF", "French Guiana"),
    country!("GG", "GGY", "Guernsey"),
    country!("GH", "GHA", "Ghana", ["Republic of Ghana"]),
    country!("GI", "GIB", "Gibraltar"),
    country!("GL", "GRL", "Greenland"),
    country!("GM", "GMB", "Gambia", ["Republic of the Gambia", "The Gambia"]),
    country!("GN", "GIN", "Guinea", ["Republic of Guinea"]),
    country!("GP", "GLP", "Guadeloupe"),
    country!("GQ", "GNQ", "Equatorial Guinea", ["Republic of Equatorial Guinea"]),
    country!("GR", "GRC", "Greece", ["Hellenic Republic"]),
    country!("GS", "SGS", "South Georgia and the South Sandwich Islands"),
    country!("GT", "GTM", "Guatemala", ["Republic of Guatemala"]),
    country!("GU", "GUM", "Guam"),
    country!("GW", "GNB", "Guinea-Bissau", ["Republic of Guinea-Bissau"]),
    country!("GY", "GUY", "Guyana", ["Republic of Guyana"]),
    country!("HK", "HKG", "Hong Kong", ["Hong Kong Special Administrative Region of China"]),
    country!("HM", "HMD", "Heard Island and McDonald Islands"),
    country!("HN", "HND", "Honduras", ["Republic of Honduras"]),
    country!("HR", "HRV", "Croatia", ["Republic of Croatia"]),
    country!("HT", "HTI", "Haiti", ["Republic of Haiti"]),
    country!("HU", "HUN", "Hungary"),
    country!("ID", "IDN", "Indonesia", ["Republic of Indonesia"]),
    country!("IE", "IRL", "Ireland", ["Republic of Ireland"]),
    country!("IL", "ISR", "Israel", ["State of Israel"]),
    country!("IM", "IMN", "Isle of Man"),
    country!("IN", "IND", "India", ["Republic of India"]),
    country!("IO", "IOT", "British Indian Ocean Territory"),
    country!("IQ", "IRQ", "Iraq", ["Republic of Iraq"]),
    country!("IR", "IRN", "Iran, Islamic Republic of", ["Iran", "Islamic Republic of Iran"]),
    country!("IS", "ISL", "Iceland", ["Republic of Iceland"]),
    country!("IT", "ITA", "Italy", ["Italian Republic"]),
    country!("JE", "JEY", "Jersey"),
    country!("JM", "JAM", "Jamaica"),
    country!("JO", "JOR", "Jordan", ["Hashemite Kingdom of Jordan"]),
    country!("JP", "JPN", "Japan"),
    country!("KE", "KEN", "Kenya", ["Republic of Kenya"]),
    country!("KG", "KGZ", "Kyrgyzstan", ["Kyrgyz Republic"]),
    country!("KH", "KHM", "Cambodia", ["Kingdom of Cambodia"]),
    country!("KI", "KIR", "Kiribati", ["Republic of Kiribati"]),
    country!("KM", "COM", "Comoros", ["Union of the Comoros"]),
    country!("KN", "KNA", "Saint Kitts and Nevis", ["St Kitts and Nevis"]),
    country!("KP", "PRK", "Korea, Democratic People's Republic of", ["North Korea", "Democratic People's Republic of Korea"]),
    country!("KR", "KOR", "Korea, Republic of", ["South Korea", "Republic of Korea"]),
    country!("KW", "KWT", "Kuwait", ["State of Kuwait"]),
    country!("KY", "CYM", "Cayman Islands"),
    country!("KZ", "KAZ", "Kazakhstan", ["Republic of Kazakhstan"]),
    country!("LA", "LAO", "Lao People's Democratic Republic", ["Laos"]),
    country!("LB", "LBN", "Lebanon", ["Lebanese Republic"]),
    country!("LC", "LCA", "Saint Lucia", ["St Lucia"]),
    country!("LI", "LIE", "Liechtenstein", ["Principality of Liechtenstein"]),
    country!("LK", "LKA", "Sri Lanka", ["Democratic Socialist Republic of Sri Lanka"]),
    country!("LR", "LBR", "Liberia", ["Republic of Liberia"]),
    country!("LS", "LSO", "Lesotho", ["Kingdom of Lesotho"]),
    country!("LT", "LTU", "Lithuania", ["Republic of Lithuania"]),
    country!("LU", "LUX", "Luxembourg", ["Grand Duchy of Luxembourg"]),
    country!("LV", "LVA", "Latvia", ["Republic of Latvia"]),
    country!("LY", "LBY", "Libya", ["State of Libya"]),
    country!("MA", "MAR", "Morocco", ["Kingdom of Morocco"]),
    country!("MC", "MCO", "Monaco", ["Principality of Monaco"]),
    country!("MD", "MDA", "Moldova, Republic of", ["Moldova", "Republic of Moldova"]),
    country!("ME", "MNE", "Montenegro"),
    country!("MF", "MAF", "Saint Martin (French part)", ["Saint Martin"]),
    country!("MG", "MDG", "Madagascar", ["Republic of Madagascar"]),
    country!("MH", "MHL", "Marshall Islands", ["Republic of the Marshall Islands"]),
    country!("MK", "MKD", "North Macedonia", ["Republic of North Macedonia", "Macedonia"]),
    country!("ML", "MLI", "Mali", ["Republic of Mali"]),
    country!("MM", "MMR", "Myanmar", ["Republic of Myanmar", "Burma"]),
    country!("MN", "MNG", "Mongolia"),
    country!("MO", "MAC", "Macao", ["Macau", "Macao Special Administrative Region of China"]),
    country!("MP", "MNP", "Northern Mariana Islands", ["Commonwealth of the Northern Mariana Islands"]),
    country!("MQ", "MTQ", "Martinique"),
    country!("MR", "MRT", "Mauritania", ["Islamic Republic of Mauritania"]),
    country!("MS", "MSR", "Montserrat"),
    country!("MT", "MLT", "Malta", ["Republic of Malta"]),
    country!("MU", "MUS", "Mauritius", ["Republic of Mauritius"]),
    country!("MV", "MDV", "Maldives", ["Republic of Maldives"]),
    country!("MW", "MWI", "Malawi", ["Republic of Malawi"]),
    country!("MX", "MEX", "Mexico", ["United Mexican States"]),
    country!("MY", "MYS", "Malaysia"),
    country!("MZ", "MOZ", "Mozambique", ["Republic of Mozambique"]),
    country!("NA", "NAM", "Namibia", ["Republic of Namibia"]),
    country!("NC", "NCL", "New Caledonia"),
    country!("NE", "NER", "Niger", ["Republic of the Niger"]),
    country!("NF", "NFK", "Norfolk Island"),
    country!("NG", "NGA", "Nigeria", ["Federal Republic of Nigeria"]),
    country!("NI", "NIC", "Nicaragua", ["Republic of Nicaragua"]),
    country!("NL", "NLD", "Netherlands", ["Kingdom of the Netherlands", "The Netherlands", "Holland"]),
    country!("NO", "NOR", "Norway", ["Kingdom of Norway"]),
    country!("NP", "NPL", "Nepal", ["Federal Democratic Republic of Nepal"]),
    country!("NR", "NRU", "Nauru", ["Republic of Nauru"]),
    country!("NU", "NIU", "Niue"),
    country!("NZ", "NZL", "New Zealand"),
    country!("OM", "OMN", "Oman", ["Sultanate of Oman"]),
    country!("PA", "PAN", "Panama", ["Republic of Panama"]),
    country!("PE", "PER", "Peru", ["Republic of Peru"]),
    country!("PF", "PYF", "French Polynesia"),
    country!("PG", "PNG", "Papua New Guinea", ["Independent State of Papua New Guinea"]),
    country!("PH", "PHL", "Philippines", ["Republic of the Philippines"]),
    country!("PK", "PAK", "Pakistan", ["Islamic Republic of Pakistan"]),
    country!("PL", "POL", "Poland", ["Republic of Poland"]),
    country!("PM", "SPM", "Saint Pierre and Miquelon"),
    country!("PN", "PCN", "Pitcairn", ["Pitcairn Islands"]),
    country!("PR", "PRI", "Puerto Rico"),
    country!("PS", "PSE", "Palestine, State of", ["Palestine", "State of Palestine", "Palestinian Territory"]),
    country!("PT", "PRT", "Portugal", ["Portuguese Republic"]),
    country!("PW", "PLW", "Palau", ["Republic of Palau"]),
    country!("PY", "PRY", "Paraguay", ["Republic of Paraguay"]),
    country!("QA", "QAT", "Qatar", ["State of Qatar"]),
    country!("RE", "REU", "Réunion", ["Reunion"]),
    country!("RO", "ROU", "Romania"),
    country!("RS", "SRB", "Serbia", ["Republic of Serbia"]),
    country!("RU", "RUS", "Russian Federation", ["Russia"]),
    country!("RW", "RWA", "Rwanda", ["Rwandese Republic"]),
    country!("SA", "SAU", "Saudi Arabia", ["Kingdom of Saudi Arabia"]),
    country!("SB", "SLB", "Solomon Islands"),
    country!("SC", "SYC", "Seychelles", ["Republic of Seychelles"]),
    country!("SD", "SDN", "Sudan", ["Republic of the Sudan"]),
    country!("SE", "SWE", "Sweden", ["Kingdom of Sweden"]),
    country!("SG", "SGP", "Singapore", ["Republic of Singapore"]),
    country!("SH", "SHN", "Saint Helena, Ascension and Tristan da Cunha", ["Saint Helena"]),
    country!("SI", "SVN", "Slovenia", ["Republic of Slovenia"]),
    country!("SJ", "SJM", "Svalbard and Jan Mayen"),
    country!("SK", "SVK", "Slovakia", ["Slovak Republic"]),
    country!("SL", "SLE", "Sierra Leone", ["Republic of Sierra Leone"]),
    country!("SM", "SMR", "San Marino", ["Republic of San Marino"]),
    country!("SN", "SEN", "Senegal", ["Republic of Senegal"]),
    country!("SO", "SOM", "Somalia", ["Federal Republic of Somalia"]),
    country!("SR", "SUR", "Suriname", ["Republic of Suriname"]),
    country!("SS", "SSD", "South Sudan", ["Republic of South Sudan"]),
    country!("ST", "STP", "Sao Tome and Principe", ["São Tomé and Príncipe"]),
    country!("SV", "SLV", "El Salvador", ["Republic of El Salvador"]),
    country!("SX", "SXM", "Sint Maarten (Dutch part)", ["Sint Maarten"]),
    country!("SY", "SYR", "Syrian Arab Republic", ["Syria"]),
    country!("SZ", "SWZ", "Eswatini", ["Kingdom of Eswatini", "Swaziland"]),
    country!("TC", "TCA", "Turks and Caicos Islands"),
    country!("TD", "TCD", "Chad", ["Republic of Chad"]),
    country!("TF", "ATF", "French Southern Territories"),
    country!("TG", "TGO", "Togo", ["Togolese Republic"]),
    country!("TH", "THA", "Thailand", ["Kingdom of Thailand"]),
    country!("TJ", "TJK", "Tajikistan", ["Republic of Tajikistan"]),
    country!("TK", "TKL", "Tokelau"),
    country!("TL", "TLS", "Timor-Leste", ["Democratic Republic of Timor-Leste", "East Timor"]),
    country!("TM", "TKM", "Turkmenistan"),
    country!("TN", "TUN", "Tunisia", ["Republic of Tunisia"]),
    country!("TO", "TON", "Tonga", ["Kingdom of Tonga"]),
    country!("TR", "TUR", "Türkiye", ["Turkey", "Republic of Türkiye"]),
    country!("TT", "TTO", "Trinidad and Tobago", ["Republic of Trinidad and Tobago"]),
    country!("TV", "TUV", "Tuvalu"),
    country!("TW", "TWN", "Taiwan, Province of China", ["Taiwan"]),
    country!("TZ", "TZA", "Tanzania, United Republic of", ["Tanzania", "United Republic of Tanzania"]),
    country!("UA", "UKR", "Ukraine"),
    country!("UG", "UGA", "Uganda", ["Republic of Uganda"]),
    country!("UM", "UMI", "United States Minor Outlying Islands"),
    country!("US", "USA", "United States", ["United States of America", "USA", "America"]),
    country!("UY", "URY", "Uruguay", ["Eastern Republic of Uruguay"]),
    country!("UZ", "UZB", "Uzbekistan", ["Republic of Uzbekistan"]),
    country!("VA", "VAT", "Holy See (Vatican City State)", ["Vatican City", "Holy See"]),
    country!("VC", "VCT", "Saint Vincent and the Grenadines", ["St Vincent and Grenadines"]),
    country!("VE", "VEN", "Venezuela, Bolivarian Republic of", ["Venezuela", "Bolivarian Republic of Venezuela"]),
    country!("VG", "VGB", "Virgin Islands, British", ["British Virgin Islands"]),
    country!("VI", "VIR", "Virgin Islands, U.S.", ["U.S. Virgin Islands", "United States Virgin Islands"]),
    country!("VN", "VNM", "Viet Nam", ["Vietnam", "Socialist Republic of Viet Nam"]),
    country!("VU", "VUT", "Vanuatu", ["Republic of Vanuatu"]),
    country!("WF", "WLF", "Wallis and Futuna"),
    country!("WS", "WSM", "Samoa", ["Independent State of Samoa"]),
    country!("XK", "XKX", "Kosovo"),
    country!("YE", "YEM", "Yemen", ["Republic of Yemen"]),
    country!("YT", "MYT", "Mayotte"),
    country!("ZA", "ZAF", "South Africa", ["Republic of South Africa"]),
    country!("ZM", "ZMB", "Zambia", ["Republic of Zambia"]),
    country!("ZW", "ZWE", "Zimbabwe", ["Republic of Zimbabwe"]),
];

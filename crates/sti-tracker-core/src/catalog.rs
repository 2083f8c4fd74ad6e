//! Static configuration tables: supported STIs, profile tags, and the valid
//! test types and results for each infection.
//!
//! Lookups never fail. An unknown STI falls back to [`FALLBACK_TEST_TYPES`]
//! for test types and to [`COMMON_RESULTS`] for results.

/// Catch-all option offered for every STI.
pub const OTHER_UNKNOWN: &str = "Other / Don’t know";

/// Test types offered when the STI is not in the table.
pub const FALLBACK_TEST_TYPES: &[&str] = &[OTHER_UNKNOWN];

/// Results offered when the STI is not in the table.
pub const COMMON_RESULTS: &[&str] = &[
    "Negative / Non-reactive",
    "Positive / Reactive",
    "Not detected",
    "Inconclusive",
    OTHER_UNKNOWN,
];

/// Every STI the app can track, in display order.
pub const STIS: &[&str] = &[
    "HIV",
    "Syphilis",
    "Gonorrhea",
    "Chlamydia",
    "Hepatitis A",
    "Hepatitis B",
    "Hepatitis C",
    "Genital herpes",
    "Human papillomavirus (HPV)",
    "Mycoplasma genitalium",
    "Trichomoniasis",
    "LGV (Lymphogranuloma venereum)",
];

/// Profile tags a user may attach to their preferences.
pub const PROFILE_TAGS: &[&str] = &[
    "MSM (Men who have sex with men)",
    "WSW (Women who have sex with women)",
    "Bisexual",
    "Trans woman",
    "Trans man",
    "Non-binary",
    "PrEP user",
    "PEP user",
    "Living with HIV",
    "Multiple partners",
    "Casual partners",
    "Chemsex",
    "Sex work",
    "Serodiscordant couple",
    "Vaccinated Hepatitis A/B",
    "Vaccinated HPV",
];

/// Reminder hour preselected when none is stored.
pub const DEFAULT_REMINDER_HOUR: &str = "08:00";

const TEST_TYPES: &OptionTable = &[
    (
        "HIV",
        &[
            "Ag/Ab 4th generation (ELISA)",
            "Rapid antibody test",
            "Western blot",
            "PCR (RNA viral load)",
            "Self-test (oral fluid)",
            OTHER_UNKNOWN,
        ],
    ),
    (
        "Syphilis",
        &[
            "VDRL (Venereal Disease Research Laboratory)",
            "RPR (Rapid Plasma Reagin)",
            "TPHA (Treponema pallidum hemagglutination)",
            "FTA-ABS (Fluorescent treponemal antibody absorption)",
            "Rapid treponemal test",
            OTHER_UNKNOWN,
        ],
    ),
    (
        "Gonorrhea",
        &[
            "PCR / NAAT (urine or swab)",
            "Culture test (Neisseria gonorrhoeae)",
            "Gram stain (urethral swab)",
            OTHER_UNKNOWN,
        ],
    ),
    (
        "Chlamydia",
        &[
            "PCR / NAAT (urine or swab)",
            "Culture test",
            "Rapid antigen test",
            OTHER_UNKNOWN,
        ],
    ),
    (
        "Hepatitis A",
        &[
            "HAV IgM antibody (acute infection)",
            "HAV total antibodies (immunity check)",
            OTHER_UNKNOWN,
        ],
    ),
    (
        "Hepatitis B",
        &[
            "HBsAg (surface antigen)",
            "Anti-HBs (surface antibody)",
            "Anti-HBc (core antibody)",
            "HBV DNA (viral load PCR)",
            OTHER_UNKNOWN,
        ],
    ),
    (
        "Hepatitis C",
        &[
            "Anti-HCV antibody",
            "HCV RNA PCR (viral load)",
            "HCV genotype test",
            OTHER_UNKNOWN,
        ],
    ),
    (
        "Genital herpes",
        &[
            "HSV-1/HSV-2 PCR (swab)",
            "Viral culture",
            "HSV IgG/IgM serology",
            OTHER_UNKNOWN,
        ],
    ),
    (
        "Human papillomavirus (HPV)",
        &[
            "HPV DNA test (PCR)",
            "Pap smear (cytology)",
            "Visual inspection with acetic acid (VIA)",
            OTHER_UNKNOWN,
        ],
    ),
    (
        "Mycoplasma genitalium",
        &[
            "PCR / NAAT (urine or swab)",
            "Antibiotic resistance PCR",
            OTHER_UNKNOWN,
        ],
    ),
    (
        "Trichomoniasis",
        &[
            "Wet mount microscopy",
            "PCR / NAAT",
            "Antigen test (rapid test)",
            OTHER_UNKNOWN,
        ],
    ),
    (
        "LGV (Lymphogranuloma venereum)",
        &[
            "Chlamydia trachomatis L1–L3 genotyping (PCR)",
            "NAAT with LGV confirmation",
            OTHER_UNKNOWN,
        ],
    ),
];

const RESULTS: &OptionTable = &[
    (
        "HIV",
        &[
            "Negative / Non-reactive",
            "Positive / Reactive",
            "Indeterminate",
            OTHER_UNKNOWN,
        ],
    ),
    (
        "Syphilis",
        &["Non-reactive", "Reactive", "Inconclusive", OTHER_UNKNOWN],
    ),
    (
        "Gonorrhea",
        &["Detected", "Not detected", "Inconclusive", OTHER_UNKNOWN],
    ),
    (
        "Chlamydia",
        &["Detected", "Not detected", "Inconclusive", OTHER_UNKNOWN],
    ),
    (
        "Hepatitis A",
        &["IgM positive", "IgM negative", "Immune (total Ab+)", OTHER_UNKNOWN],
    ),
    (
        "Hepatitis B",
        &[
            "HBsAg positive",
            "HBsAg negative",
            "Immune (anti-HBs+)",
            OTHER_UNKNOWN,
        ],
    ),
    (
        "Hepatitis C",
        &[
            "Antibody positive",
            "Antibody negative",
            "RNA detected",
            "RNA not detected",
            OTHER_UNKNOWN,
        ],
    ),
    (
        "Genital herpes",
        &[
            "HSV detected",
            "Not detected",
            "Serology positive",
            "Serology negative",
            OTHER_UNKNOWN,
        ],
    ),
    (
        "Human papillomavirus (HPV)",
        &[
            "HPV detected",
            "HPV not detected",
            "Abnormal cytology",
            "Normal cytology",
            OTHER_UNKNOWN,
        ],
    ),
    (
        "Mycoplasma genitalium",
        &["Detected", "Not detected", OTHER_UNKNOWN],
    ),
    ("Trichomoniasis", &["Detected", "Not detected", OTHER_UNKNOWN]),
    (
        "LGV (Lymphogranuloma venereum)",
        &["LGV detected", "Not detected", OTHER_UNKNOWN],
    ),
];

type OptionTable = [(&'static str, &'static [&'static str])];

fn lookup(table: &'static OptionTable, sti: &str) -> Option<&'static [&'static str]> {
    table
        .iter()
        .find(|(name, _)| *name == sti)
        .map(|(_, options)| *options)
}

/// Valid test types for an STI.
pub fn test_types_for(sti: &str) -> &'static [&'static str] {
    lookup(TEST_TYPES, sti).unwrap_or(FALLBACK_TEST_TYPES)
}

/// Valid results for an STI.
pub fn results_for(sti: &str) -> &'static [&'static str] {
    lookup(RESULTS, sti).unwrap_or(COMMON_RESULTS)
}

/// Check whether an STI name is part of the supported list.
pub fn is_known_sti(sti: &str) -> bool {
    STIS.contains(&sti)
}

/// The 24 selectable reminder hours, `00:00` through `23:00`.
pub fn reminder_hours() -> Vec<String> {
    (0..24).map(|h| format!("{:02}:00", h)).collect()
}

/// Check that a reminder hour is one of [`reminder_hours`].
pub fn is_valid_reminder_hour(hour: &str) -> bool {
    match hour.split_once(':') {
        Some((h, "00")) if h.len() == 2 => h.parse::<u8>().map(|h| h < 24).unwrap_or(false),
        _ => false,
    }
}

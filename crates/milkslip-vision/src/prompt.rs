//! The fixed extraction instruction sent with every receipt photo.

/// Build the instruction prompt for one extraction attempt.
///
/// The wording pins down the one reading mistake receipts invite: they
/// habitually print both a per-unit rate in paise and the billed per-unit
/// rate in rupees, and the naive choice bills with the wrong one.
pub fn extraction_prompt() -> String {
    [
        "This is a dairy milk-collection receipt. Read it and extract the following fields:",
        "- date: collection date, formatted DD/MM/YYYY",
        "- quantity: milk quantity in liters",
        "- fat: fat percentage",
        "- clr: corrected lactometer reading (CLR)",
        "- fat_kg: fat in kilograms, if printed",
        "- snf_kg: solids-not-fat in kilograms, if printed",
        "- base_rate: the printed per-unit rate in PAISE (minor currency units). \
         This is the smaller rate figure on the receipt, NOT the billed rate.",
        "- rate: the effective per-unit rate actually billed, in RUPEES (major currency units).",
        "- amount: the total billed amount in rupees",
        "",
        "Respond with exactly one JSON object containing these keys and nothing else. \
         All values must be strings. Omit any key you cannot read from the receipt; \
         never guess and never substitute zero for a value that is not printed.",
    ]
    .join("\n")
}

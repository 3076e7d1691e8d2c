/// Color-by values of the form `gt-<gene>_<position>` select a genotype coloring.
pub const GENOTYPE_PREFIX: &str = "gt-";

pub fn is_genotype(color_by: &str) -> bool {
    color_by.starts_with(GENOTYPE_PREFIX)
}

/// Frequency series key for a genotype coloring: `gt-HA1_159` -> `global_HA1:159`.
///
/// Only the gene/position split is done here; full genotype parsing belongs
/// to the genotype collaborator.
pub fn genotype_frequency_key(color_by: &str) -> Option<String> {
    let rest = color_by.strip_prefix(GENOTYPE_PREFIX)?;
    let (gene, position) = rest.split_once('_')?;
    if gene.is_empty() || position.is_empty() {
        return None;
    }
    Some(format!("global_{gene}:{position}"))
}

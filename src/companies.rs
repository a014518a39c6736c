use serde::Serialize;

/// A company that recently cut staff; the starting point of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoffCompany {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// CSS class of the logo tile.
    pub logo_background: &'static str,
    pub logo_char: &'static str,
    /// Human-readable recency, e.g. "2 weeks ago".
    pub last_layoff: &'static str,
    /// Headcount change in percent (negative for cuts).
    pub headcount_change: i32,
    pub headcount_change_count: u32,
    pub layoff_percentage: u32,
    pub layoff_count: u32,
}

pub const LAYOFF_COMPANIES: &[LayoffCompany] = &[
    LayoffCompany {
        id: "1",
        name: "TechVision AI",
        description: "AI-powered computer vision platform for enterprise applications",
        logo_background: "bg-purple-600",
        logo_char: "T",
        last_layoff: "2 weeks ago",
        headcount_change: -15,
        headcount_change_count: 120,
        layoff_percentage: 18,
        layoff_count: 85,
    },
    LayoffCompany {
        id: "2",
        name: "CloudScale",
        description: "Enterprise cloud infrastructure and scaling solutions",
        logo_background: "bg-blue-500",
        logo_char: "C",
        last_layoff: "1 month ago",
        headcount_change: -22,
        headcount_change_count: 230,
        layoff_percentage: 25,
        layoff_count: 180,
    },
    LayoffCompany {
        id: "3",
        name: "DataSphere",
        description: "Big data analytics and visualization platform",
        logo_background: "bg-green-600",
        logo_char: "D",
        last_layoff: "3 weeks ago",
        headcount_change: -12,
        headcount_change_count: 45,
        layoff_percentage: 15,
        layoff_count: 32,
    },
    LayoffCompany {
        id: "4",
        name: "FinEdge",
        description: "Next-generation fintech solutions for banking and finance",
        logo_background: "bg-indigo-600",
        logo_char: "F",
        last_layoff: "2 days ago",
        headcount_change: -30,
        headcount_change_count: 150,
        layoff_percentage: 35,
        layoff_count: 120,
    },
    LayoffCompany {
        id: "5",
        name: "RoboLogic",
        description: "Robotics and automation solutions for manufacturing",
        logo_background: "bg-red-500",
        logo_char: "R",
        last_layoff: "1 week ago",
        headcount_change: -8,
        headcount_change_count: 25,
        layoff_percentage: 10,
        layoff_count: 18,
    },
    LayoffCompany {
        id: "6",
        name: "HealthTech Innovations",
        description: "Digital health platforms and telemedicine solutions",
        logo_background: "bg-teal-500",
        logo_char: "H",
        last_layoff: "5 days ago",
        headcount_change: -18,
        headcount_change_count: 65,
        layoff_percentage: 22,
        layoff_count: 48,
    },
    LayoffCompany {
        id: "7",
        name: "SecureNet",
        description: "Cybersecurity and network protection services",
        logo_background: "bg-gray-700",
        logo_char: "S",
        last_layoff: "2 weeks ago",
        headcount_change: -14,
        headcount_change_count: 42,
        layoff_percentage: 16,
        layoff_count: 35,
    },
    LayoffCompany {
        id: "8",
        name: "EcoSmart",
        description: "Sustainable technology solutions for green businesses",
        logo_background: "bg-emerald-600",
        logo_char: "E",
        last_layoff: "3 days ago",
        headcount_change: -25,
        headcount_change_count: 75,
        layoff_percentage: 28,
        layoff_count: 62,
    },
    LayoffCompany {
        id: "9",
        name: "MetaVerse Technologies",
        description: "Virtual reality and augmented reality platforms",
        logo_background: "bg-violet-600",
        logo_char: "M",
        last_layoff: "1 month ago",
        headcount_change: -35,
        headcount_change_count: 280,
        layoff_percentage: 40,
        layoff_count: 220,
    },
    LayoffCompany {
        id: "10",
        name: "BlockChain Innovations",
        description: "Blockchain solutions for enterprise and finance",
        logo_background: "bg-amber-600",
        logo_char: "B",
        last_layoff: "2 weeks ago",
        headcount_change: -20,
        headcount_change_count: 60,
        layoff_percentage: 24,
        layoff_count: 45,
    },
];

/// Companies whose name or description contains `search`, case-insensitively.
///
/// A missing or blank search returns the whole catalogue.
pub fn search_companies(search: Option<&str>) -> Vec<&'static LayoffCompany> {
    let needle = search.map(str::trim).unwrap_or_default().to_lowercase();
    LAYOFF_COMPANIES
        .iter()
        .filter(|company| {
            needle.is_empty()
                || company.name.to_lowercase().contains(&needle)
                || company.description.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_search_returns_everything() {
        assert_eq!(search_companies(None).len(), 10);
        assert_eq!(search_companies(Some("  ")).len(), 10);
    }

    #[test]
    fn search_matches_name_and_description() {
        let by_name: Vec<_> = search_companies(Some("cloudscale"))
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(by_name, vec!["CloudScale"]);

        let by_description: Vec<_> = search_companies(Some("FINANCE"))
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(by_description, vec!["FinEdge", "BlockChain Innovations"]);
    }

    #[test]
    fn serializes_for_the_dashboard() {
        let json = serde_json::to_value(&LAYOFF_COMPANIES[0]).unwrap();
        assert_eq!(json["logoBackground"], "bg-purple-600");
        assert_eq!(json["headcountChange"], -15);
    }
}

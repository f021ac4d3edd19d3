//! Built-in policy catalogue shown when no backend answers.

use serde_json::{Map, Value};

use crate::api::types::{Policy, PolicyCount};

struct Entry {
    id: &'static str,
    name: &'static str,
    region: &'static str,
    support_type: &'static str,
    max_amount: f64,
    deadline: &'static str,
    tags: &'static [&'static str],
    requirements: &'static [&'static str],
    score: f64,
    period: &'static str,
    recommendation: &'static str,
    source_url: &'static str,
    department: &'static str,
    description: &'static str,
}

const XUHUI_INDUSTRY_OFFICE: &str = "徐汇区新型工业化推进办公室";

const ENTRIES: &[Entry] = &[
    Entry {
        id: "XH2024003",
        name: "关于支持上海市生成式人工智能创新生态先导区的若干措施",
        region: "徐汇区",
        support_type: "subsidy",
        max_amount: 50_000_000.0,
        deadline: "2024-12-31",
        tags: &["生成式AI", "大模型", "创新生态"],
        requirements: &["企业注册地在先导区", "从事生成式AI相关业务", "企业信用状况良好"],
        score: 0.90,
        period: "全年申报",
        recommendation: "针对大模型和生成式AI企业的重点政策，支持力度最大。",
        source_url: "https://www.xuhui.gov.cn/xxgk/portal/article/detail?id=8a4c0c0692292eab019384dc95a70aed",
        department: XUHUI_INDUSTRY_OFFICE,
        description: "支持生成式AI技术研发创新，最高可给予5000万元支持。",
    },
    Entry {
        id: "XH2024001",
        name: "徐汇区关于推动人工智能产业高质量发展的若干意见",
        region: "徐汇区",
        support_type: "subsidy",
        max_amount: 50_000_000.0,
        deadline: "2024-12-31",
        tags: &["人工智能", "科技创新", "制造业"],
        requirements: &[
            "企业注册地在徐汇区",
            "从事人工智能相关业务",
            "企业信用状况良好",
            "符合国家产业政策",
        ],
        score: 0.85,
        period: "全年申报",
        recommendation: "该政策对AI企业支持力度大，建议符合条件的企业积极申报。",
        source_url: "https://www.xuhui.gov.cn/xxgk/portal/article/detail?id=8a4c0c0692292eab01934dd52e3d09b9",
        department: XUHUI_INDUSTRY_OFFICE,
        description: "支持人工智能领域创新主体开展关键技术攻关，最高可给予5000万元支持。",
    },
    Entry {
        id: "XH2024002",
        name: "徐汇区关于推动具身智能产业发展的若干意见",
        region: "徐汇区",
        support_type: "subsidy",
        max_amount: 20_000_000.0,
        deadline: "2024-12-31",
        tags: &["具身智能", "机器人", "智能制造"],
        requirements: &["企业注册地在徐汇区", "从事具身智能相关业务", "企业信用状况良好"],
        score: 0.80,
        period: "全年申报",
        recommendation: "适合机器人和智能制造企业申报，支持力度较大。",
        source_url: "https://www.xuhui.gov.cn/xxgk/portal/article/detail?id=8a4c0c0692292eab01934dd6cfbd09bb",
        department: XUHUI_INDUSTRY_OFFICE,
        description: "支持具身智能产业发展，对规模以上创新企业最高可给予2000万元经营奖励。",
    },
    Entry {
        id: "GJ2024001",
        name: "国家高新技术企业认定管理办法",
        region: "全国",
        support_type: "tax",
        max_amount: 0.0,
        deadline: "2024-12-31",
        tags: &["高新技术", "税收优惠", "企业认定"],
        requirements: &[
            "成立一年以上",
            "拥有核心自主知识产权",
            "研发投入占比不低于规定标准",
            "高新技术产品收入占比60%以上",
        ],
        score: 0.80,
        period: "每年4-6月",
        recommendation: "所有符合条件的科技企业都应该申报，税收优惠显著。",
        source_url: "http://www.most.gov.cn/",
        department: "科技部",
        description: "享受15%企业所得税优惠税率，是最重要的税收优惠政策之一。",
    },
    Entry {
        id: "GJ2024002",
        name: "中小企业发展专项资金管理办法",
        region: "全国",
        support_type: "grant",
        max_amount: 2_000_000.0,
        deadline: "2024-10-15",
        tags: &["中小企业", "专精特新", "创新发展"],
        requirements: &["符合中小企业标准", "具有自主知识产权", "属于专精特新领域", "具有良好发展前景"],
        score: 0.78,
        period: "每年7-10月",
        recommendation: "专精特新中小企业的重要资金来源，建议积极申报。",
        source_url: "http://www.miit.gov.cn/",
        department: "工信部",
        description: "支持中小企业创新发展和转型升级，最高可获得200万元资金支持。",
    },
    Entry {
        id: "SH2024001",
        name: "上海市科技创新券实施办法",
        region: "上海市",
        support_type: "voucher",
        max_amount: 500_000.0,
        deadline: "2024-12-31",
        tags: &["科技创新", "创新券", "研发服务"],
        requirements: &["注册地在上海市", "符合中小微企业标准", "具有研发需求", "信用状况良好"],
        score: 0.75,
        period: "全年申报",
        recommendation: "门槛较低，适合初创企业和中小微企业申报。",
        source_url: "http://stcsm.sh.gov.cn/",
        department: "上海市科委",
        description: "为中小微企业提供科技创新券，用于购买研发服务，最高50万元。",
    },
];

/// The built-in policies, highest base score first.
pub fn policies() -> Vec<Policy> {
    ENTRIES
        .iter()
        .map(|e| Policy {
            policy_id: Some(e.id.to_string()),
            policy_name: e.name.to_string(),
            region: e.region.to_string(),
            support_type: e.support_type.to_string(),
            max_amount: Some(e.max_amount),
            deadline: Some(e.deadline.to_string()),
            industry_tags: e.tags.iter().map(|t| t.to_string()).collect(),
            requirements: e.requirements.iter().map(|r| r.to_string()).collect(),
            match_score: Some(e.score),
            base_score: Some(e.score),
            recommendation: Some(e.recommendation.to_string()),
            application_period: Some(e.period.to_string()),
            source_url: Some(e.source_url.to_string()),
            description: Some(e.description.to_string()),
            extra: Map::from_iter([(
                "approval_department".to_string(),
                Value::String(e.department.to_string()),
            )]),
            ..Policy::default()
        })
        .collect()
}

/// Summary counts for a policy list, keyed the way `/policies/count` is.
pub fn stats(policies: &[Policy]) -> PolicyCount {
    let by_region = [("xuhui", "徐汇区"), ("shanghai", "上海市"), ("national", "全国")]
        .into_iter()
        .map(|(key, region)| (key.to_string(), count_where(policies, |p| p.region == region)))
        .collect();
    let by_type = ["grant", "subsidy", "tax", "voucher"]
        .into_iter()
        .map(|t| (t.to_string(), count_where(policies, |p| p.support_type == t)))
        .collect();

    PolicyCount {
        total_policies: policies.len() as u64,
        active_policies: policies.len() as u64,
        by_region,
        by_type,
    }
}

fn count_where(policies: &[Policy], f: impl Fn(&Policy) -> bool) -> u64 {
    policies.iter().filter(|p| f(p)).count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_is_ordered_by_score() {
        let policies = policies();
        assert_eq!(policies.len(), 6);
        assert!(policies
            .windows(2)
            .all(|w| w[0].base_score >= w[1].base_score));
        assert_eq!(policies[0].policy_id.as_deref(), Some("XH2024003"));
        assert_eq!(policies[0].base_score, Some(0.90));
    }

    #[test]
    fn test_catalogue_carries_display_fields() {
        let policies = policies();
        assert!(policies.iter().all(|p| p.source_url.is_some() && p.description.is_some()));
        let tax = policies
            .iter()
            .find(|p| p.policy_id.as_deref() == Some("GJ2024001"))
            .unwrap();
        assert_eq!(tax.extra["approval_department"], "科技部");

        // Display fields survive the wire format unchanged.
        let json = serde_json::to_value(tax).unwrap();
        assert_eq!(json["approval_department"], "科技部");
        assert_eq!(json["source_url"], "http://www.most.gov.cn/");
    }

    #[test]
    fn test_stats() {
        let stats = stats(&policies());
        assert_eq!(stats.total_policies, 6);
        assert_eq!(stats.by_region["xuhui"], 3);
        assert_eq!(stats.by_region["national"], 2);
        assert_eq!(stats.by_region["shanghai"], 1);
        assert_eq!(stats.by_type["subsidy"], 3);
        assert_eq!(stats.by_type["tax"], 1);
        assert_eq!(stats.by_type["voucher"], 1);
    }
}

//! Canned consultation replies used when no AI backend answers.
//!
//! Replies are chosen by keyword class and are fully deterministic for a
//! given message and policy context.

use crate::api::types::PolicyContext;

const HOTLINE: &str = "400-123-4567";
const SERVICE_HOURS: &str = "工作日 9:00-18:00";
const SERVICE_EMAIL: &str = "policy@policypilot.com";

/// Which canned reply a message maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    /// Questions about a policy, applying, or eligibility.
    Policy,
    HighTech,
    Process,
    Materials,
    General,
}

fn contains_any(message: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| message.contains(k))
}

/// Classify a user message. Earlier classes take precedence.
pub fn classify(message: &str) -> Topic {
    let message = message.to_lowercase();
    if contains_any(&message, &["政策", "申请", "条件"]) {
        Topic::Policy
    } else if contains_any(&message, &["高新", "认定"]) {
        Topic::HighTech
    } else if contains_any(&message, &["流程", "步骤", "怎么申请"]) {
        Topic::Process
    } else if contains_any(&message, &["材料", "文件", "准备什么"]) {
        Topic::Materials
    } else {
        Topic::General
    }
}

/// Produce the degraded-mode answer for `message`.
pub fn reply(message: &str, policy: Option<&PolicyContext>) -> String {
    match (classify(message), policy) {
        (Topic::Policy, Some(policy)) => policy_reply(message, policy),
        (Topic::Policy, None) => policy_guidance(),
        (Topic::HighTech, _) => high_tech(),
        (Topic::Process, _) => process(),
        (Topic::Materials, _) => materials(),
        (Topic::General, _) => general(),
    }
}

/// Render a support ceiling in 亿元 / 万元 / 元.
pub fn format_amount(amount: Option<f64>) -> String {
    match amount {
        None => "未限定".to_string(),
        Some(a) if a <= 0.0 => "未限定".to_string(),
        Some(a) if a >= 100_000_000.0 => format!("{:.1}亿元", a / 100_000_000.0),
        Some(a) if a >= 10_000.0 => format!("{:.1}万元", a / 10_000.0),
        Some(a) => format!("{}元", a),
    }
}

/// Render `YYYY-MM-DD…` as `YYYY年M月D日`; other text is returned as is.
pub fn format_date(date: Option<&str>) -> String {
    let Some(date) = date else {
        return "长期有效".to_string();
    };
    let mut parts = date.get(..10).unwrap_or(date).splitn(3, '-');
    match (
        parts.next().and_then(|y| y.parse::<u32>().ok()),
        parts.next().and_then(|m| m.parse::<u32>().ok()),
        parts.next().and_then(|d| d.parse::<u32>().ok()),
    ) {
        (Some(y), Some(m), Some(d)) if (1..=12).contains(&m) && (1..=31).contains(&d) => {
            format!("{}年{}月{}日", y, m, d)
        }
        _ => date.to_string(),
    }
}

fn support_label(support_type: &str) -> &'static str {
    match support_type {
        "grant" => "资金补贴",
        "tax" => "税收优惠",
        _ => "政策支持",
    }
}

fn policy_reply(message: &str, policy: &PolicyContext) -> String {
    let message = message.to_lowercase();
    let amount = format_amount(policy.max_amount);

    if contains_any(&message, &["条件", "要求"]) {
        let requirements = if policy.requirements.is_empty() {
            "• 请查看政策原文了解详细要求".to_string()
        } else {
            policy
                .requirements
                .iter()
                .map(|r| format!("• {}", r))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let industries = if policy.industry_tags.is_empty() {
            "通用".to_string()
        } else {
            policy.industry_tags.join("、")
        };
        return format!(
            "关于\"{name}\"的申请条件：\n\n\
             📍 **基本要求**\n{requirements}\n\n\
             💰 **支持金额**：最高 {amount}\n\
             📅 **发布时间**：{published}\n\
             🏢 **适用地区**：{region}\n\
             🏭 **适用行业**：{industries}\n\n\
             📞 **获得详细指导**\n\
             建议您联系我们的专业顾问团队，获得针对性的申请指导：\n\
             • 电话：{HOTLINE}\n\
             • 在线咨询：{SERVICE_HOURS}",
            name = policy.policy_name,
            published = format_date(policy.publish_date.as_deref()),
            region = policy.region,
        );
    }

    if contains_any(&message, &["流程", "申请"]) {
        let period = policy.application_period.as_deref().unwrap_or("请关注官方通知");
        return format!(
            "\"{name}\"申请流程指导：\n\n\
             📝 **申请准备**\n\
             • 仔细阅读政策文件\n\
             • 评估企业匹配度\n\
             • 准备相关材料\n\n\
             📋 **材料清单**\n\
             • 企业基本信息\n\
             • 财务证明材料\n\
             • 项目相关文件\n\
             • 其他政策要求的特定材料\n\n\
             ⏰ **时间安排**\n\
             • 申报期：{period}\n\
             • 审核周期：一般15-30个工作日\n\n\
             💡 **成功建议**\n\
             建议您在申请前咨询专业顾问，提高申请成功率。",
            name = policy.policy_name,
        );
    }

    format!(
        "关于\"{name}\"：\n\n\
         💰 **支持金额**：最高 {amount}\n\
         📍 **适用地区**：{region}\n\
         🏭 **支持类型**：{label}\n\n\
         📞 **专业咨询**\n\
         如需了解更多详情，建议联系我们的政策顾问：\n\
         • 电话：{HOTLINE}\n\
         • 在线客服：{SERVICE_HOURS}\n\n\
         您还有其他想了解的问题吗？",
        name = policy.policy_name,
        region = policy.region,
        label = support_label(&policy.support_type),
    )
}

fn policy_guidance() -> String {
    format!(
        "关于您询问的政策问题，我建议您：\n\n\
         📋 **查看政策详情**\n\
         • 访问我们的政策看板页面\n\
         • 查看具体的申请条件和要求\n\
         • 了解申请流程和时间节点\n\n\
         📞 **联系专业顾问**\n\
         • 电话：{HOTLINE}\n\
         • 邮箱：{SERVICE_EMAIL}\n\
         • 在线客服：{SERVICE_HOURS}\n\n\
         🔍 **推荐操作**\n\
         • 完善企业信息以获得精准匹配\n\
         • 查看相似企业的成功案例\n\
         • 关注政策更新通知\n\n\
         如需更详细的指导，建议您联系我们的专业政策顾问团队。"
    )
}

fn high_tech() -> String {
    format!(
        "关于高新技术企业认定，我为您提供基本信息：\n\n\
         📋 **主要认定条件**\n\
         1. 企业成立一年以上\n\
         2. 拥有核心自主知识产权\n\
         3. 产品属于《国家重点支持的高新技术领域》\n\
         4. 科技人员占比不低于10%\n\
         5. 研发费用占比符合要求\n\n\
         ⭐ **优惠政策**\n\
         • 企业所得税减按15%征收\n\
         • 研发费用加计扣除\n\
         • 各类政府补贴优先支持\n\n\
         📞 如需详细指导，请联系：{HOTLINE}"
    )
}

fn process() -> String {
    "政策申请一般流程如下：\n\n\
     📝 **第一步：准备阶段**\n\
     • 了解政策详细要求\n\
     • 评估企业匹配度\n\
     • 准备基础材料\n\n\
     📤 **第二步：提交申请**\n\
     • 在线填写申请表\n\
     • 上传相关材料\n\n\
     ⏰ **第三步：审核流程**\n\
     • 初审（5-10个工作日）\n\
     • 专家评审\n\
     • 结果公示\n\n\
     💡 **温馨提示**\n\
     建议您先通过我们的政策匹配系统评估申请成功率，然后联系专业顾问获得个性化指导。"
        .to_string()
}

fn materials() -> String {
    "政策申请通常需要以下材料：\n\n\
     📄 **基础材料**\n\
     • 营业执照副本\n\
     • 企业章程\n\n\
     💰 **财务材料**\n\
     • 近三年财务报表\n\
     • 审计报告\n\
     • 纳税证明\n\n\
     🔬 **技术材料**\n\
     • 知识产权证书\n\
     • 研发项目资料\n\n\
     👥 **人员材料**\n\
     • 员工花名册\n\
     • 社保缴费证明\n\n\
     💡 **建议**：不同政策要求的材料可能有所差异，建议根据具体政策要求准备。"
        .to_string()
}

fn general() -> String {
    format!(
        "感谢您的咨询！虽然AI服务暂时不可用，但我仍然可以为您提供帮助：\n\n\
         🎯 **我可以协助您**\n\
         • 政策查询和匹配\n\
         • 申请条件解读\n\
         • 流程指导\n\
         • 材料准备建议\n\n\
         📞 **获得专业帮助**\n\
         • 热线电话：{HOTLINE}\n\
         • 在线客服：{SERVICE_HOURS}\n\
         • 邮箱咨询：{SERVICE_EMAIL}\n\n\
         如果您有具体的政策问题，请详细描述，我会尽力为您提供有用的信息！"
    )
}

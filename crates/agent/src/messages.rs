//! Per-locale message tables
//!
//! Every supported locale carries a full table; lookups for a locale never
//! fail and never mix languages within one response.

use storefront_chat_core::Locale;

/// Fixed strings for one locale
#[derive(Debug)]
pub struct MessageTable {
    pub greeting: &'static str,
    pub thanks: &'static str,
    pub matches: &'static str,
    pub featured: &'static str,
    pub no_product_data: &'static str,
    pub shipping_generic: &'static str,
    pub returns_generic: &'static str,
    pub shipping_label: &'static str,
    pub returns_label: &'static str,
    pub support: &'static str,
    pub support_escalation: &'static str,
    pub apology: &'static str,
    pub quota_exceeded: &'static str,
    /// `{count}` is replaced with the units left
    pub low_stock: &'static str,
    pub quick_replies_products: [&'static str; 3],
    pub quick_replies_browse: [&'static str; 3],
    pub action_view_product: &'static str,
    pub action_compare: &'static str,
    pub action_browse: &'static str,
    pub action_view_policy: &'static str,
    pub action_contact: &'static str,
}

impl MessageTable {
    /// Urgency line for a low-inventory product
    pub fn low_stock_line(&self, count: i64) -> String {
        self.low_stock.replace("{count}", &count.to_string())
    }
}

/// Message table for a locale
pub fn table(locale: Locale) -> &'static MessageTable {
    match locale {
        Locale::En => &EN,
        Locale::Fr => &FR,
        Locale::Es => &ES,
        Locale::De => &DE,
        Locale::It => &IT,
        Locale::Pt => &PT,
        Locale::Ja => &JA,
        Locale::Zh => &ZH,
    }
}

static EN: MessageTable = MessageTable {
    greeting: "Hi there! I can help you find products, check availability, or answer questions about shipping and returns. What are you looking for today?",
    thanks: "You're welcome! Let me know if there's anything else I can help you find.",
    matches: "Here are some products that match what you're looking for:",
    featured: "I couldn't find an exact match, but here are some popular picks from our store:",
    no_product_data: "I don't have product information to search right now. Please browse the store or try again in a moment.",
    shipping_generic: "We ship to most locations. Delivery times and costs are shown at checkout, and you'll receive tracking details once your order is on its way.",
    returns_generic: "Most items can be returned or exchanged. Please check the returns page of our store for the exact conditions, or contact us and we'll help you out.",
    shipping_label: "Here's our shipping policy:",
    returns_label: "Here's our returns policy:",
    support: "I'm here to help. Could you share a few details, such as your order number, so our team can look into it?",
    support_escalation: "I'm sorry about this experience. I've flagged your conversation so a member of our team can follow up with you personally.",
    apology: "Sorry, I'm having trouble answering right now. Please try again in a moment.",
    quota_exceeded: "Our chat assistant is taking a short break. Please browse the store or contact us directly and we'll be happy to help.",
    low_stock: "Only {count} left in stock!",
    quick_replies_products: ["Show me more", "Compare these", "What's on sale?"],
    quick_replies_browse: ["Show popular products", "Shipping info", "Return policy"],
    action_view_product: "View product",
    action_compare: "Compare products",
    action_browse: "Browse catalog",
    action_view_policy: "View store policies",
    action_contact: "Contact support",
};

static FR: MessageTable = MessageTable {
    greeting: "Bonjour ! Je peux vous aider à trouver des produits, vérifier leur disponibilité ou répondre à vos questions sur la livraison et les retours. Que recherchez-vous ?",
    thanks: "Avec plaisir ! N'hésitez pas si je peux vous aider à trouver autre chose.",
    matches: "Voici quelques produits qui correspondent à votre recherche :",
    featured: "Je n'ai pas trouvé de correspondance exacte, mais voici quelques articles populaires de notre boutique :",
    no_product_data: "Je n'ai pas d'informations produit à consulter pour le moment. Parcourez la boutique ou réessayez dans un instant.",
    shipping_generic: "Nous livrons dans la plupart des pays. Les délais et frais de livraison sont indiqués lors du paiement, et vous recevrez un numéro de suivi dès l'expédition.",
    returns_generic: "La plupart des articles peuvent être retournés ou échangés. Consultez la page retours de la boutique pour les conditions exactes, ou contactez-nous.",
    shipping_label: "Voici notre politique de livraison :",
    returns_label: "Voici notre politique de retour :",
    support: "Je suis là pour vous aider. Pouvez-vous nous donner quelques détails, comme votre numéro de commande, afin que notre équipe puisse s'en occuper ?",
    support_escalation: "Je suis désolé pour ce désagrément. J'ai signalé votre conversation afin qu'un membre de notre équipe vous recontacte personnellement.",
    apology: "Désolé, je rencontre un problème pour répondre. Veuillez réessayer dans un instant.",
    quota_exceeded: "Notre assistant fait une courte pause. Parcourez la boutique ou contactez-nous directement, nous serons ravis de vous aider.",
    low_stock: "Plus que {count} en stock !",
    quick_replies_products: ["Voir plus", "Comparer", "Quelles sont les promotions ?"],
    quick_replies_browse: ["Produits populaires", "Infos livraison", "Politique de retour"],
    action_view_product: "Voir le produit",
    action_compare: "Comparer les produits",
    action_browse: "Parcourir le catalogue",
    action_view_policy: "Voir les conditions",
    action_contact: "Contacter le support",
};

static ES: MessageTable = MessageTable {
    greeting: "¡Hola! Puedo ayudarte a encontrar productos, consultar disponibilidad o responder preguntas sobre envíos y devoluciones. ¿Qué estás buscando hoy?",
    thanks: "¡De nada! Avísame si puedo ayudarte a encontrar algo más.",
    matches: "Estos son algunos productos que coinciden con lo que buscas:",
    featured: "No encontré una coincidencia exacta, pero aquí tienes algunos de los productos más populares de la tienda:",
    no_product_data: "Ahora mismo no tengo información de productos para buscar. Explora la tienda o inténtalo de nuevo en un momento.",
    shipping_generic: "Enviamos a la mayoría de destinos. Los plazos y costes de envío se muestran al pagar, y recibirás el seguimiento cuando tu pedido salga.",
    returns_generic: "La mayoría de los artículos se pueden devolver o cambiar. Consulta la página de devoluciones de la tienda para ver las condiciones exactas, o contáctanos.",
    shipping_label: "Esta es nuestra política de envíos:",
    returns_label: "Esta es nuestra política de devoluciones:",
    support: "Estoy aquí para ayudarte. ¿Podrías darnos algunos detalles, como tu número de pedido, para que nuestro equipo lo revise?",
    support_escalation: "Lamento mucho lo ocurrido. He marcado tu conversación para que una persona de nuestro equipo se ponga en contacto contigo.",
    apology: "Lo siento, tengo problemas para responder ahora mismo. Inténtalo de nuevo en un momento.",
    quota_exceeded: "Nuestro asistente está tomando un breve descanso. Explora la tienda o contáctanos directamente y con gusto te ayudaremos.",
    low_stock: "¡Solo quedan {count} en stock!",
    quick_replies_products: ["Ver más", "Comparar", "¿Qué hay en oferta?"],
    quick_replies_browse: ["Productos populares", "Información de envío", "Política de devoluciones"],
    action_view_product: "Ver producto",
    action_compare: "Comparar productos",
    action_browse: "Ver catálogo",
    action_view_policy: "Ver políticas de la tienda",
    action_contact: "Contactar con soporte",
};

static DE: MessageTable = MessageTable {
    greeting: "Hallo! Ich helfe dir gerne dabei, Produkte zu finden, die Verfügbarkeit zu prüfen oder Fragen zu Versand und Rückgabe zu beantworten. Wonach suchst du?",
    thanks: "Gern geschehen! Sag Bescheid, wenn ich dir noch bei etwas helfen kann.",
    matches: "Hier sind einige Produkte, die zu deiner Suche passen:",
    featured: "Ich habe keinen genauen Treffer gefunden, aber hier sind einige beliebte Artikel aus unserem Shop:",
    no_product_data: "Mir liegen gerade keine Produktinformationen zum Durchsuchen vor. Stöbere im Shop oder versuche es gleich noch einmal.",
    shipping_generic: "Wir liefern an die meisten Orte. Lieferzeiten und Versandkosten werden an der Kasse angezeigt, und du erhältst eine Sendungsverfolgung, sobald deine Bestellung unterwegs ist.",
    returns_generic: "Die meisten Artikel können zurückgegeben oder umgetauscht werden. Die genauen Bedingungen findest du auf der Rückgabeseite des Shops, oder kontaktiere uns.",
    shipping_label: "Unsere Versandrichtlinie:",
    returns_label: "Unsere Rückgaberichtlinie:",
    support: "Ich helfe dir gerne. Kannst du uns ein paar Details wie deine Bestellnummer nennen, damit sich unser Team darum kümmern kann?",
    support_escalation: "Das tut mir leid. Ich habe deine Unterhaltung markiert, damit sich jemand aus unserem Team persönlich bei dir meldet.",
    apology: "Entschuldigung, ich kann gerade nicht antworten. Bitte versuche es gleich noch einmal.",
    quota_exceeded: "Unser Chat-Assistent macht gerade eine kurze Pause. Stöbere im Shop oder kontaktiere uns direkt, wir helfen dir gerne.",
    low_stock: "Nur noch {count} auf Lager!",
    quick_replies_products: ["Mehr anzeigen", "Vergleichen", "Was ist im Angebot?"],
    quick_replies_browse: ["Beliebte Produkte", "Versandinfos", "Rückgaberecht"],
    action_view_product: "Produkt ansehen",
    action_compare: "Produkte vergleichen",
    action_browse: "Katalog durchsuchen",
    action_view_policy: "Shop-Richtlinien ansehen",
    action_contact: "Support kontaktieren",
};

static IT: MessageTable = MessageTable {
    greeting: "Ciao! Posso aiutarti a trovare prodotti, verificare la disponibilità o rispondere a domande su spedizioni e resi. Cosa stai cercando oggi?",
    thanks: "Prego! Fammi sapere se posso aiutarti a trovare qualcos'altro.",
    matches: "Ecco alcuni prodotti in linea con la tua ricerca:",
    featured: "Non ho trovato una corrispondenza esatta, ma ecco alcuni articoli popolari del negozio:",
    no_product_data: "Al momento non ho informazioni sui prodotti da consultare. Sfoglia il negozio o riprova tra un attimo.",
    shipping_generic: "Spediamo nella maggior parte delle località. Tempi e costi di spedizione sono indicati al checkout e riceverai il tracciamento appena l'ordine parte.",
    returns_generic: "La maggior parte degli articoli può essere resa o cambiata. Controlla la pagina resi del negozio per le condizioni esatte, oppure contattaci.",
    shipping_label: "Ecco la nostra politica di spedizione:",
    returns_label: "Ecco la nostra politica di reso:",
    support: "Sono qui per aiutarti. Puoi indicarci qualche dettaglio, come il numero d'ordine, così il nostro team potrà verificare?",
    support_escalation: "Mi dispiace per l'inconveniente. Ho segnalato la conversazione così una persona del nostro team ti contatterà direttamente.",
    apology: "Spiacente, al momento non riesco a rispondere. Riprova tra un attimo.",
    quota_exceeded: "Il nostro assistente è in pausa. Sfoglia il negozio o contattaci direttamente, saremo felici di aiutarti.",
    low_stock: "Solo {count} disponibili!",
    quick_replies_products: ["Mostrami altro", "Confronta", "Cosa c'è in offerta?"],
    quick_replies_browse: ["Prodotti popolari", "Info spedizione", "Politica di reso"],
    action_view_product: "Vedi prodotto",
    action_compare: "Confronta prodotti",
    action_browse: "Sfoglia il catalogo",
    action_view_policy: "Vedi le condizioni",
    action_contact: "Contatta l'assistenza",
};

static PT: MessageTable = MessageTable {
    greeting: "Olá! Posso ajudar você a encontrar produtos, verificar disponibilidade ou responder dúvidas sobre envio e devoluções. O que você procura hoje?",
    thanks: "De nada! Me avise se eu puder ajudar a encontrar mais alguma coisa.",
    matches: "Aqui estão alguns produtos que combinam com o que você procura:",
    featured: "Não encontrei uma correspondência exata, mas aqui estão alguns itens populares da loja:",
    no_product_data: "No momento não tenho informações de produtos para pesquisar. Navegue pela loja ou tente novamente em instantes.",
    shipping_generic: "Enviamos para a maioria dos locais. Prazos e custos de envio aparecem no checkout, e você receberá o rastreamento assim que o pedido for despachado.",
    returns_generic: "A maioria dos itens pode ser devolvida ou trocada. Confira a página de devoluções da loja para as condições exatas, ou fale conosco.",
    shipping_label: "Esta é a nossa política de envio:",
    returns_label: "Esta é a nossa política de devolução:",
    support: "Estou aqui para ajudar. Pode compartilhar alguns detalhes, como o número do pedido, para que nossa equipe verifique?",
    support_escalation: "Sinto muito por isso. Sinalizei a conversa para que alguém da nossa equipe entre em contato com você pessoalmente.",
    apology: "Desculpe, estou com dificuldade para responder agora. Tente novamente em instantes.",
    quota_exceeded: "Nosso assistente está fazendo uma pausa. Navegue pela loja ou fale conosco diretamente, teremos prazer em ajudar.",
    low_stock: "Apenas {count} em estoque!",
    quick_replies_products: ["Mostrar mais", "Comparar", "O que está em promoção?"],
    quick_replies_browse: ["Produtos populares", "Informações de envio", "Política de devolução"],
    action_view_product: "Ver produto",
    action_compare: "Comparar produtos",
    action_browse: "Ver catálogo",
    action_view_policy: "Ver políticas da loja",
    action_contact: "Falar com o suporte",
};

static JA: MessageTable = MessageTable {
    greeting: "こんにちは！商品探し、在庫の確認、配送や返品に関するご質問にお答えします。本日は何をお探しですか？",
    thanks: "どういたしまして！他にお探しのものがあれば、お気軽にどうぞ。",
    matches: "お探しの条件に合う商品はこちらです：",
    featured: "完全に一致する商品は見つかりませんでしたが、人気の商品をご紹介します：",
    no_product_data: "現在、検索できる商品情報がありません。ストアをご覧いただくか、しばらくしてから再度お試しください。",
    shipping_generic: "ほとんどの地域へ配送しております。配送日数と送料はご購入手続き時に表示され、発送後に追跡情報をお送りします。",
    returns_generic: "ほとんどの商品は返品・交換が可能です。詳しい条件はストアの返品ページをご確認いただくか、お問い合わせください。",
    shipping_label: "配送ポリシーはこちらです：",
    returns_label: "返品ポリシーはこちらです：",
    support: "お手伝いいたします。担当チームが確認できるよう、ご注文番号などの詳細をお知らせいただけますか？",
    support_escalation: "ご不便をおかけして申し訳ございません。担当者から直接ご連絡できるよう、この会話を共有いたしました。",
    apology: "申し訳ございません。現在お答えできません。しばらくしてから再度お試しください。",
    quota_exceeded: "チャットアシスタントは現在休止中です。ストアをご覧いただくか、直接お問い合わせください。",
    low_stock: "残り{count}点のみ！",
    quick_replies_products: ["もっと見る", "比較する", "セール中の商品は？"],
    quick_replies_browse: ["人気の商品", "配送について", "返品ポリシー"],
    action_view_product: "商品を見る",
    action_compare: "商品を比較",
    action_browse: "カタログを見る",
    action_view_policy: "ストアのポリシーを見る",
    action_contact: "サポートに連絡",
};

static ZH: MessageTable = MessageTable {
    greeting: "你好！我可以帮你查找商品、查询库存，或解答关于配送和退换货的问题。今天想找点什么？",
    thanks: "不客气！如果还需要找其他商品，随时告诉我。",
    matches: "以下是符合你需求的商品：",
    featured: "没有找到完全匹配的商品，不过这里有一些店内热门商品：",
    no_product_data: "目前没有可搜索的商品信息。请浏览店铺或稍后再试。",
    shipping_generic: "我们可配送至大多数地区。配送时间和运费会在结账时显示，订单发出后你会收到物流追踪信息。",
    returns_generic: "大多数商品支持退换货。具体条件请查看店铺的退货页面，或联系我们获取帮助。",
    shipping_label: "我们的配送政策如下：",
    returns_label: "我们的退换货政策如下：",
    support: "我很乐意帮忙。能否提供订单号等信息，以便我们的团队为你处理？",
    support_escalation: "非常抱歉给你带来不便。我已标记此对话，我们的工作人员会亲自与你联系。",
    apology: "抱歉，我现在无法回答。请稍后再试。",
    quota_exceeded: "聊天助手暂时休息中。请浏览店铺或直接联系我们，我们很乐意为你提供帮助。",
    low_stock: "仅剩{count}件！",
    quick_replies_products: ["查看更多", "比较这些商品", "有什么优惠？"],
    quick_replies_browse: ["热门商品", "配送信息", "退货政策"],
    action_view_product: "查看商品",
    action_compare: "比较商品",
    action_browse: "浏览商品目录",
    action_view_policy: "查看店铺政策",
    action_contact: "联系客服",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_locale_is_complete() {
        for locale in Locale::ALL {
            let t = table(locale);
            let fields = [
                t.greeting,
                t.thanks,
                t.matches,
                t.featured,
                t.no_product_data,
                t.shipping_generic,
                t.returns_generic,
                t.shipping_label,
                t.returns_label,
                t.support,
                t.support_escalation,
                t.apology,
                t.quota_exceeded,
                t.action_view_product,
                t.action_compare,
                t.action_browse,
                t.action_view_policy,
                t.action_contact,
            ];
            assert!(fields.iter().all(|f| !f.trim().is_empty()), "{} has an empty entry", locale);
            assert!(t.low_stock.contains("{count}"), "{} low stock template", locale);
        }
    }

    #[test]
    fn test_low_stock_line() {
        assert_eq!(table(Locale::En).low_stock_line(2), "Only 2 left in stock!");
        assert_eq!(table(Locale::Ja).low_stock_line(3), "残り3点のみ！");
    }

    #[test]
    fn test_support_texts_never_deny_products() {
        for locale in Locale::ALL {
            let t = table(locale);
            for text in [t.support, t.support_escalation, t.shipping_generic, t.returns_generic] {
                assert!(!text.to_lowercase().contains("no products"));
            }
        }
    }
}
